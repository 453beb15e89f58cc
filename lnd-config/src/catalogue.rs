// lnd-config/src/catalogue.rs
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::fmt;
use std::ops::Bound;
use std::str::FromStr;
use std::sync::LazyLock;

pub static CATALOGUE: LazyLock<ConfigSpec> = LazyLock::new(build);

// ---------------------------------------------------------------------
// Spec types
// ---------------------------------------------------------------------

/// Entries kept in declaration order, serialized as a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct Ordered<V>(pub Vec<(&'static str, V)>);

impl<V> Ordered<V> {
    pub fn get(&self, key: &str) -> Option<&V> {
        self.0.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(&'static str, V)> {
        self.0.iter()
    }
}

impl<V: Serialize> Serialize for Ordered<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

pub type Fields = Ordered<ValueSpec>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Meta {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ValueSpec {
    String(StringSpec),
    Number(NumberSpec),
    Boolean(BooleanSpec),
    Enum(EnumSpec),
    List(ListSpec),
    Object(ObjectSpec),
    Union(UnionSpec),
    Pointer(PointerSpec),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StringDefault {
    Literal(&'static str),
    /// `len` characters drawn from `charset` (`"a-f,0-9"` style ranges).
    Generated { charset: &'static str, len: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct StringSpec {
    #[serde(flatten)]
    pub meta: Meta,
    pub nullable: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub copyable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_description: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<StringDefault>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct NumberSpec {
    #[serde(flatten)]
    pub meta: Meta,
    pub nullable: bool,
    pub range: NumRange,
    pub integral: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BooleanSpec {
    #[serde(flatten)]
    pub meta: Meta,
    pub default: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct EnumSpec {
    #[serde(flatten)]
    pub meta: Meta,
    pub values: Vec<&'static str>,
    pub value_names: Ordered<&'static str>,
    pub default: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListItemSpec {
    pub masked: bool,
    pub copyable: bool,
    pub placeholder: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListSpec {
    #[serde(flatten)]
    pub meta: Meta,
    pub range: NumRange,
    /// Element type; the catalogue only declares lists of strings.
    pub subtype: &'static str,
    pub spec: ListItemSpec,
    pub default: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectSpec {
    #[serde(flatten)]
    pub meta: Meta,
    pub spec: Fields,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct UnionTag {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub variant_names: Ordered<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnionSpec {
    #[serde(flatten)]
    pub meta: Meta,
    pub tag: UnionTag,
    pub default: &'static str,
    pub variants: Ordered<Fields>,
}

/// A value the host resolves from another package or interface.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PointerSpec {
    #[serde(flatten)]
    pub meta: Meta,
    pub subtype: &'static str,
    pub package_id: &'static str,
    pub target: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multi: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<&'static str>,
}

/// The whole catalogue: the top-level fields of a record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ConfigSpec {
    pub fields: Fields,
}

// ---------------------------------------------------------------------
// Numeric ranges
// ---------------------------------------------------------------------

/// Interval in the host's notation: `[1,16777215]`, `[1,*)`, `[0,1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumRange {
    pub min: Bound<f64>,
    pub max: Bound<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid range '{0}'")]
pub struct RangeParseError(String);

impl NumRange {
    pub const fn closed(min: f64, max: f64) -> Self {
        Self {
            min: Bound::Included(min),
            max: Bound::Included(max),
        }
    }

    pub const fn half_open(min: f64, max: f64) -> Self {
        Self {
            min: Bound::Included(min),
            max: Bound::Excluded(max),
        }
    }

    pub const fn at_least(min: f64) -> Self {
        Self {
            min: Bound::Included(min),
            max: Bound::Unbounded,
        }
    }

    pub fn contains(&self, x: f64) -> bool {
        let above = match self.min {
            Bound::Included(m) => x >= m,
            Bound::Excluded(m) => x > m,
            Bound::Unbounded => true,
        };
        let below = match self.max {
            Bound::Included(m) => x <= m,
            Bound::Excluded(m) => x < m,
            Bound::Unbounded => true,
        };
        above && below
    }
}

impl fmt::Display for NumRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.min {
            Bound::Included(m) => write!(f, "[{m}")?,
            Bound::Excluded(m) => write!(f, "({m}")?,
            Bound::Unbounded => f.write_str("(*")?,
        }
        f.write_str(",")?;
        match self.max {
            Bound::Included(m) => write!(f, "{m}]"),
            Bound::Excluded(m) => write!(f, "{m})"),
            Bound::Unbounded => f.write_str("*)"),
        }
    }
}

impl FromStr for NumRange {
    type Err = RangeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || RangeParseError(s.to_string());
        let t = s.trim();
        let (lo, hi) = t.split_once(',').ok_or_else(err)?;
        let (lo, hi) = (lo.trim(), hi.trim());

        let bound = |v: &str, inclusive: bool| -> Result<Bound<f64>, RangeParseError> {
            let v = v.trim();
            if v == "*" {
                return Ok(Bound::Unbounded);
            }
            let n = v.parse::<f64>().map_err(|_| err())?;
            Ok(if inclusive {
                Bound::Included(n)
            } else {
                Bound::Excluded(n)
            })
        };

        let min = if let Some(rest) = lo.strip_prefix('[') {
            bound(rest, true)?
        } else if let Some(rest) = lo.strip_prefix('(') {
            bound(rest, false)?
        } else {
            return Err(err());
        };
        let max = if let Some(rest) = hi.strip_suffix(']') {
            bound(rest, true)?
        } else if let Some(rest) = hi.strip_suffix(')') {
            bound(rest, false)?
        } else {
            return Err(err());
        };
        Ok(Self { min, max })
    }
}

impl Serialize for NumRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------

/// Expands `"a-f,0-9"` into the characters it names.
fn expand_charset(charset: &str) -> Vec<char> {
    let mut out = Vec::new();
    for part in charset.split(',') {
        let chars: Vec<char> = part.trim().chars().collect();
        match chars.as_slice() {
            [from, '-', to] => out.extend(*from..=*to),
            single => out.extend_from_slice(single),
        }
    }
    out
}

fn generate<R: Rng + ?Sized>(charset: &str, len: usize, rng: &mut R) -> String {
    let chars = expand_charset(charset);
    (0..len).filter_map(|_| chars.choose(&mut *rng)).collect()
}

impl ConfigSpec {
    /// A fresh record built from every declared default.
    ///
    /// Nullable fields without a default are `null`. Pointers are left out;
    /// the host fills them in.
    pub fn default_record<R: Rng + ?Sized>(&self, rng: &mut R) -> Value {
        Value::Object(default_fields(&self.fields, rng))
    }

    pub fn get(&self, key: &str) -> Option<&ValueSpec> {
        self.fields.get(key)
    }

    /// Checks `record` against every declared field. Undeclared fields are
    /// ignored.
    pub fn validate(&self, record: &Value) -> Vec<FieldError> {
        let mut errors = Vec::new();
        match record.as_object() {
            Some(map) => validate_fields(&self.fields, map, "", &mut errors),
            None => errors.push(FieldError::new("", "record must be an object")),
        }
        errors
    }
}

fn default_fields<R: Rng + ?Sized>(fields: &Fields, rng: &mut R) -> Map<String, Value> {
    let mut map = Map::new();
    for (key, spec) in fields.iter() {
        if let Some(v) = spec.default_value(rng) {
            map.insert(key.to_string(), v);
        }
    }
    map
}

impl ValueSpec {
    pub fn meta(&self) -> &Meta {
        match self {
            ValueSpec::String(s) => &s.meta,
            ValueSpec::Number(s) => &s.meta,
            ValueSpec::Boolean(s) => &s.meta,
            ValueSpec::Enum(s) => &s.meta,
            ValueSpec::List(s) => &s.meta,
            ValueSpec::Object(s) => &s.meta,
            ValueSpec::Union(s) => &s.meta,
            ValueSpec::Pointer(s) => &s.meta,
        }
    }

    /// Whether the field may be absent or `null` in a valid record.
    pub fn is_nullable(&self) -> bool {
        match self {
            ValueSpec::String(s) => s.nullable,
            ValueSpec::Number(s) => s.nullable,
            ValueSpec::Pointer(_) => true,
            _ => false,
        }
    }

    pub fn default_value<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Value> {
        match self {
            ValueSpec::String(s) => match &s.default {
                Some(StringDefault::Literal(v)) => Some(Value::from(*v)),
                Some(StringDefault::Generated { charset, len }) => {
                    Some(Value::from(generate(charset, *len, rng)))
                }
                None if s.nullable => Some(Value::Null),
                None => None,
            },
            ValueSpec::Number(s) => match &s.default {
                Some(n) => Some(Value::Number(n.clone())),
                None if s.nullable => Some(Value::Null),
                None => None,
            },
            ValueSpec::Boolean(s) => Some(Value::Bool(s.default)),
            ValueSpec::Enum(s) => Some(Value::from(s.default)),
            ValueSpec::List(s) => Some(Value::from(s.default.clone())),
            ValueSpec::Object(s) => Some(Value::Object(default_fields(&s.spec, rng))),
            ValueSpec::Union(s) => {
                let mut map = s
                    .variants
                    .get(s.default)
                    .map(|fields| default_fields(fields, rng))
                    .unwrap_or_default();
                map.insert(s.tag.id.to_string(), Value::from(s.default));
                Some(Value::Object(map))
            }
            ValueSpec::Pointer(_) => None,
        }
    }
}

// ---------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

impl FieldError {
    fn new(path: &str, message: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

fn child_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn validate_fields(
    fields: &Fields,
    map: &Map<String, Value>,
    path: &str,
    errors: &mut Vec<FieldError>,
) {
    for (key, spec) in fields.iter() {
        let here = child_path(path, key);
        match map.get(*key) {
            None | Some(Value::Null) => {
                if !spec.is_nullable() {
                    errors.push(FieldError::new(&here, "is required"));
                }
            }
            Some(value) => spec.validate_value(value, &here, errors),
        }
    }
}

impl ValueSpec {
    fn validate_value(&self, value: &Value, path: &str, errors: &mut Vec<FieldError>) {
        match self {
            ValueSpec::String(s) => {
                let Some(text) = value.as_str() else {
                    errors.push(FieldError::new(path, "must be a string"));
                    return;
                };
                if let Some(pattern) = s.pattern {
                    let matches = Regex::new(&format!("^(?:{pattern})$"))
                        .map(|re| re.is_match(text))
                        .unwrap_or(true);
                    if !matches {
                        let hint = s.pattern_description.unwrap_or(pattern);
                        errors.push(FieldError::new(path, hint.trim_end()));
                    }
                }
            }
            ValueSpec::Number(s) => {
                let Some(n) = value.as_f64() else {
                    errors.push(FieldError::new(path, "must be a number"));
                    return;
                };
                if s.integral && n.fract() != 0.0 {
                    errors.push(FieldError::new(path, "must be an integer"));
                }
                if !s.range.contains(n) {
                    errors.push(FieldError::new(
                        path,
                        format!("{n} is outside the range {}", s.range),
                    ));
                }
            }
            ValueSpec::Boolean(_) => {
                if !value.is_boolean() {
                    errors.push(FieldError::new(path, "must be a boolean"));
                }
            }
            ValueSpec::Enum(s) => match value.as_str() {
                Some(v) if s.values.iter().any(|known| *known == v) => {}
                _ => errors.push(FieldError::new(
                    path,
                    format!("must be one of {}", s.values.join(", ")),
                )),
            },
            ValueSpec::List(s) => {
                let Some(items) = value.as_array() else {
                    errors.push(FieldError::new(path, "must be a list"));
                    return;
                };
                if !s.range.contains(items.len() as f64) {
                    errors.push(FieldError::new(
                        path,
                        format!("must hold a number of entries in {}", s.range),
                    ));
                }
                for (i, item) in items.iter().enumerate() {
                    if !item.is_string() {
                        errors.push(FieldError::new(
                            &format!("{path}[{i}]"),
                            "must be a string",
                        ));
                    }
                }
            }
            ValueSpec::Object(s) => match value.as_object() {
                Some(map) => validate_fields(&s.spec, map, path, errors),
                None => errors.push(FieldError::new(path, "must be an object")),
            },
            ValueSpec::Union(s) => {
                let Some(map) = value.as_object() else {
                    errors.push(FieldError::new(path, "must be an object"));
                    return;
                };
                let tag_path = child_path(path, s.tag.id);
                let Some(tag) = map.get(s.tag.id).and_then(Value::as_str) else {
                    errors.push(FieldError::new(&tag_path, "is required"));
                    return;
                };
                match s.variants.get(tag) {
                    Some(fields) => validate_fields(fields, map, path, errors),
                    None => {
                        let known: Vec<&str> = s.variants.iter().map(|(k, _)| *k).collect();
                        errors.push(FieldError::new(
                            &tag_path,
                            format!("unknown variant '{tag}', expected one of {}", known.join(", ")),
                        ));
                    }
                }
            }
            ValueSpec::Pointer(_) => {
                if !value.is_string() {
                    errors.push(FieldError::new(path, "must be a string"));
                }
            }
        }
    }
}

// ---------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------

fn meta(name: &'static str, description: &'static str) -> Meta {
    Meta {
        name,
        description,
        warning: None,
    }
}

fn boolean(name: &'static str, description: &'static str, default: bool) -> ValueSpec {
    ValueSpec::Boolean(BooleanSpec {
        meta: meta(name, description),
        default,
    })
}

fn string(name: &'static str, description: &'static str) -> StringSpec {
    StringSpec {
        meta: meta(name, description),
        nullable: true,
        copyable: false,
        pattern: None,
        pattern_description: None,
        default: None,
    }
}

fn number(name: &'static str, description: &'static str, range: NumRange) -> NumberSpec {
    NumberSpec {
        meta: meta(name, description),
        nullable: false,
        range,
        integral: true,
        default: None,
        units: None,
    }
}

impl NumberSpec {
    fn int(mut self, default: u64) -> Self {
        self.default = Some(Number::from(default));
        self
    }

    fn float(mut self, default: f64) -> Self {
        self.integral = false;
        self.default = Number::from_f64(default);
        self
    }

    /// Accepts fractions but keeps a whole-number default as written.
    fn fractional(mut self, default: u64) -> Self {
        self.integral = false;
        self.default = Some(Number::from(default));
        self
    }

    fn units(mut self, units: &'static str) -> Self {
        self.units = Some(units);
        self
    }

    fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

impl From<NumberSpec> for ValueSpec {
    fn from(spec: NumberSpec) -> Self {
        ValueSpec::Number(spec)
    }
}

impl From<StringSpec> for ValueSpec {
    fn from(spec: StringSpec) -> Self {
        ValueSpec::String(spec)
    }
}

fn object(name: &'static str, description: &'static str, spec: Fields) -> ValueSpec {
    ValueSpec::Object(ObjectSpec {
        meta: meta(name, description),
        spec,
    })
}

fn tor_address(name: &'static str, description: &'static str, interface: &'static str) -> ValueSpec {
    ValueSpec::Pointer(PointerSpec {
        meta: meta(name, description),
        subtype: "package",
        package_id: "lnd",
        target: "tor-address",
        interface: Some(interface),
        multi: None,
        selector: None,
    })
}

fn bitcoind_rpc(name: &'static str, description: &'static str, selector: &'static str) -> ValueSpec {
    ValueSpec::Pointer(PointerSpec {
        meta: meta(name, description),
        subtype: "package",
        package_id: "bitcoind",
        target: "config",
        interface: None,
        multi: Some(false),
        selector: Some(selector),
    })
}

fn with_warning(mut spec: ValueSpec, warning: &'static str) -> ValueSpec {
    match &mut spec {
        ValueSpec::String(s) => s.meta.warning = Some(warning),
        ValueSpec::Number(s) => s.meta.warning = Some(warning),
        ValueSpec::Boolean(s) => s.meta.warning = Some(warning),
        ValueSpec::Enum(s) => s.meta.warning = Some(warning),
        ValueSpec::List(s) => s.meta.warning = Some(warning),
        ValueSpec::Object(s) => s.meta.warning = Some(warning),
        ValueSpec::Union(s) => s.meta.warning = Some(warning),
        ValueSpec::Pointer(s) => s.meta.warning = Some(warning),
    }
    spec
}

// ---------------------------------------------------------------------
// The catalogue
// ---------------------------------------------------------------------

const BITCOIND_DESCRIPTION: &str = "<p>The Bitcoin Core node to connect to:</p><ul><li><strong>None</strong>: Use the light bitcoin backend built into LND, Neutrino. If using Neutrino, please switch to using Bitcoin Core as soon as possible. Neutrino uses the BIP157/8 light client protocol, which has security risks.</li><br><li><strong>Bitcoin Core</strong>: service installed on your server. Neutrino will also be used during IBD.</li></ul>";

const SWEEPER_DESCRIPTION: &str = "'Sweep' is a LND subservice that handles funds sent from dispute resolution contracts to the internal wallet.\nThese config values help inform the sweeper to make decisions regarding how much it burns in on-chain fees in order to recover possibly contested outputs (HTLCs and Breach outputs).\n<b>WARNING: These settings can result in loss of funds if poorly configured. Refer to the LND documentation for more information: https://docs.lightning.engineering/lightning-network-tools/lnd/sweeper</b>";

fn build() -> ConfigSpec {
    ConfigSpec {
        fields: Ordered(vec![
            (
                "control-tor-address",
                tor_address(
                    "Control Tor Address",
                    "The Tor address for the control interface.",
                    "control",
                ),
            ),
            (
                "peer-tor-address",
                tor_address(
                    "Peer Tor Address",
                    "The Tor address for the peer interface.",
                    "peer",
                ),
            ),
            (
                "watchtower-tor-address",
                tor_address(
                    "Watchtower Tor Address",
                    "The Tor address for the watchtower interface.",
                    "watchtower",
                ),
            ),
            (
                "alias",
                StringSpec {
                    pattern: Some(".{1,32}"),
                    pattern_description: Some(
                        "Must be at least 1 character and no more than 32 characters",
                    ),
                    ..string(
                        "Alias",
                        "The public, human-readable name of your Lightning node",
                    )
                }
                .into(),
            ),
            (
                "externalip",
                StringSpec {
                    copyable: true,
                    ..string(
                        "External IP V4",
                        "The ip address to announce to the network for incoming peer connections",
                    )
                }
                .into(),
            ),
            (
                "color",
                StringSpec {
                    nullable: false,
                    pattern: Some("[0-9a-fA-F]{6}"),
                    pattern_description: Some(
                        "Must be a valid 6 digit hexadecimal RGB value. The first two digits are red, middle two are green, and final two are\nblue\n",
                    ),
                    default: Some(StringDefault::Generated {
                        charset: "a-f,0-9",
                        len: 6,
                    }),
                    ..string("Color", "The public color dot of your Lightning node")
                }
                .into(),
            ),
            (
                "accept-keysend",
                boolean(
                    "Accept Keysend",
                    "Allow others to send payments directly to your public key through keysend instead of having to get a new invoice\n",
                    true,
                ),
            ),
            (
                "accept-amp",
                boolean(
                    "Accept Spontaneous AMPs",
                    "If enabled, spontaneous payments through AMP will be accepted. Payments to AMP\ninvoices will be accepted regardless of this setting.\n",
                    false,
                ),
            ),
            (
                "reject-htlc",
                boolean(
                    "Reject Routing Requests",
                    "If true, LND will not forward any HTLCs that are meant as onward payments. This option will still allow LND to send\nHTLCs and receive HTLCs but lnd won't be used as a hop.\n",
                    false,
                ),
            ),
            (
                "min-chan-size",
                number(
                    "Minimum Channel Size",
                    "The smallest channel size that we should accept. Incoming channels smaller than this will be rejected.\n",
                    NumRange::closed(1.0, 16_777_215.0),
                )
                .nullable()
                .units("satoshis")
                .into(),
            ),
            (
                "max-chan-size",
                number(
                    "Maximum Channel Size",
                    "The largest channel size that we should accept. Incoming channels larger than this will be rejected.\nFor non-Wumbo channels this limit remains 16777215 satoshis by default as specified in BOLT-0002. For wumbo\nchannels this limit is 1,000,000,000 satoshis (10 BTC). Set this config option explicitly to restrict your maximum\nchannel size to better align with your risk tolerance.  Don't forget to enable Wumbo channels under 'Advanced,' if desired.\n",
                    NumRange::closed(1.0, 1_000_000_000.0),
                )
                .nullable()
                .units("satoshis")
                .into(),
            ),
            ("bitcoind", bitcoind()),
            ("autopilot", autopilot()),
            ("watchtowers", watchtowers()),
            ("advanced", advanced()),
        ]),
    }
}

fn bitcoind() -> ValueSpec {
    with_warning(
        ValueSpec::Union(UnionSpec {
            meta: meta("Bitcoin Core", BITCOIND_DESCRIPTION),
            tag: UnionTag {
                id: "type",
                name: "Bitcoin Node Type",
                description: BITCOIND_DESCRIPTION,
                variant_names: Ordered(vec![
                    ("none", "None (Built-in LND Neutrino)"),
                    ("internal", "Bitcoin Core"),
                ]),
            },
            default: "internal",
            variants: Ordered(vec![
                ("none", Ordered(vec![])),
                (
                    "internal",
                    Ordered(vec![
                        (
                            "user",
                            bitcoind_rpc(
                                "RPC Username",
                                "The username for Bitcoin Core's RPC interface",
                                "$.rpc.username",
                            ),
                        ),
                        (
                            "password",
                            bitcoind_rpc(
                                "RPC Password",
                                "The password for Bitcoin Core's RPC interface",
                                "$.rpc.password",
                            ),
                        ),
                    ]),
                ),
            ]),
        }),
        "If using Neutrino, please switch to using Bitcoin Core as soon as possible. Neutrino uses the BIP157/8 light client protocol, which has security risks.",
    )
}

fn autopilot() -> ValueSpec {
    object(
        "Autopilot",
        "Autopilot Settings",
        Ordered(vec![
            (
                "enabled",
                with_warning(
                    boolean(
                        "Enabled",
                        "If the autopilot agent should be active or not. The autopilot agent will attempt to AUTOMATICALLY OPEN CHANNELS to put your node in an advantageous position within the network graph.",
                        false,
                    ),
                    "DO NOT ENABLE AUTOPILOT IF YOU WANT TO MANAGE CHANNELS MANUALLY OR IF YOU DO NOT UNDERSTAND THIS FEATURE.",
                ),
            ),
            (
                "private",
                boolean(
                    "Private",
                    "Whether the channels created by the autopilot agent should be private or not.\nPrivate channels won't be announced to the network.\n",
                    false,
                ),
            ),
            (
                "maxchannels",
                number(
                    "Maximum Channels",
                    "The maximum number of channels that should be created.",
                    NumRange::at_least(1.0),
                )
                .int(5)
                .into(),
            ),
            (
                "allocation",
                number(
                    "Allocation",
                    "The fraction of total funds that should be committed to automatic channel\nestablishment. For example 60% means that 60% of the total funds available\nwithin the wallet should be used to automatically establish channels. The total\namount of attempted channels will still respect the \"Maximum Channels\" parameter.\n",
                    NumRange::closed(0.0, 100.0),
                )
                .fractional(60)
                .units("%")
                .into(),
            ),
            (
                "min-channel-size",
                number(
                    "Minimum Channel Size",
                    "The smallest channel that the autopilot agent should create.",
                    NumRange::at_least(0.0),
                )
                .int(20_000)
                .units("satoshis")
                .into(),
            ),
            (
                "max-channel-size",
                number(
                    "Maximum Channel Size",
                    "The largest channel that the autopilot agent should create.",
                    NumRange::at_least(0.0),
                )
                .int(16_777_215)
                .units("satoshis")
                .into(),
            ),
            (
                "advanced",
                object(
                    "Advanced",
                    "Advanced Options",
                    Ordered(vec![
                        (
                            "min-confirmations",
                            number(
                                "Minimum Confirmations",
                                "The minimum number of confirmations each of your inputs in funding transactions\ncreated by the autopilot agent must have.\n",
                                NumRange::at_least(0.0),
                            )
                            .int(1)
                            .units("blocks")
                            .into(),
                        ),
                        (
                            "confirmation-target",
                            number(
                                "Confirmation Target",
                                "The confirmation target (in blocks) for channels opened by autopilot.",
                                NumRange::at_least(0.0),
                            )
                            .int(1)
                            .units("blocks")
                            .into(),
                        ),
                    ]),
                ),
            ),
        ]),
    )
}

fn watchtowers() -> ValueSpec {
    object(
        "Watchtowers",
        "Watchtower Settings: A watchtower is a feature of a Lightning node that allows you to watch a node for potential channel breaches (the watchtower server). This functionality comes bundled in LND, but needs to be specifically enabled. Two nodes can act as each other's watchtowers, meaning they simultaneously operate in server and client mode.",
        Ordered(vec![
            (
                "wt-server",
                boolean(
                    "Enable Watchtower Server",
                    "Allow other nodes to find your watchtower server on the network.",
                    false,
                ),
            ),
            (
                "wt-client",
                ValueSpec::Union(UnionSpec {
                    meta: meta(
                        "Enable Watchtower Client",
                        "Allow your node to find other watchtower servers on the network.",
                    ),
                    tag: UnionTag {
                        id: "enabled",
                        name: "Watchtower Client Enabled",
                        description: "Enable or disable Watchtower Client",
                        variant_names: Ordered(vec![
                            ("disabled", "Disabled"),
                            ("enabled", "Enabled"),
                        ]),
                    },
                    default: "disabled",
                    variants: Ordered(vec![
                        ("disabled", Ordered(vec![])),
                        (
                            "enabled",
                            Ordered(vec![(
                                "add-watchtowers",
                                ValueSpec::List(ListSpec {
                                    meta: meta(
                                        "Add Watchtowers",
                                        "Add URIs of Watchtowers to connect to.",
                                    ),
                                    range: NumRange::at_least(1.0),
                                    subtype: "string",
                                    spec: ListItemSpec {
                                        masked: false,
                                        copyable: true,
                                        placeholder: "pubkey@host:9911",
                                    },
                                    default: vec![],
                                }),
                            )]),
                        ),
                    ]),
                }),
            ),
        ]),
    )
}

fn advanced() -> ValueSpec {
    object(
        "Advanced",
        "Advanced Options",
        Ordered(vec![
            (
                "debug-level",
                ValueSpec::Enum(EnumSpec {
                    meta: meta(
                        "Log Verbosity",
                        "Sets the level of log filtration. Trace is the most verbose, Critical is the least.\n",
                    ),
                    values: vec!["trace", "debug", "info", "warn", "error", "critical"],
                    value_names: Ordered(vec![]),
                    default: "info",
                }),
            ),
            (
                "db-bolt-no-freelist-sync",
                boolean(
                    "Disallow Bolt DB Freelist Sync",
                    "If true, prevents the database from syncing its freelist to disk.\n",
                    false,
                ),
            ),
            (
                "db-bolt-auto-compact",
                boolean(
                    "Compact Database on Startup",
                    "Performs database compaction on startup. This is necessary to keep disk usage down over time at the cost of\nhaving longer startup times.\n",
                    true,
                ),
            ),
            (
                "db-bolt-auto-compact-min-age",
                number(
                    "Minimum Autocompaction Age for Bolt DB",
                    "How long ago (in hours) the last compaction of a database file must be for it to be considered for auto\ncompaction again. Can be set to 0 to compact on every startup.\n",
                    NumRange::at_least(0.0),
                )
                .int(168)
                .units("hours")
                .into(),
            ),
            (
                "db-bolt-db-timeout",
                number(
                    "Bolt DB Timeout",
                    "How long should LND try to open the database before giving up?",
                    NumRange::closed(1.0, 86_400.0),
                )
                .int(60)
                .units("seconds")
                .into(),
            ),
            (
                "recovery-window",
                number(
                    "Recovery Window",
                    "Optional address 'look-ahead' when scanning for used keys during an on-chain recovery.  For example, a value of 2 would mean LND would stop looking for funds after finding 2 consecutive addresses that were generated but never used.  If an LND on-chain wallet was extensively used, then users may want to increase this value.  2500 is the default.",
                    NumRange::at_least(1.0),
                )
                .nullable()
                .units("addresses")
                .into(),
            ),
            (
                "payments-expiration-grace-period",
                number(
                    "Payments Expiration Grace Period",
                    "A period to wait before for closing channels with outgoing htlcs that have timed out and are a result of this\nnodes instead payment. In addition to our current block based deadline, is specified this grace period will\nalso be taken into account.\n",
                    NumRange::at_least(1.0),
                )
                .int(30)
                .units("seconds")
                .into(),
            ),
            (
                "default-remote-max-htlcs",
                number(
                    "Maximum Remote HTLCs",
                    "The default max_htlc applied when opening or accepting channels. This value limits the number of concurrent\nHTLCs that the remote party can add to the commitment. The maximum possible value is 483.\n",
                    NumRange::closed(1.0, 483.0),
                )
                .int(483)
                .units("htlcs")
                .into(),
            ),
            (
                "max-channel-fee-allocation",
                number(
                    "Maximum Channel Fee Allocation",
                    "The maximum percentage of total funds that can be allocated to a channel's commitment fee. This only applies for\nthe initiator of the channel.\n",
                    NumRange::closed(0.1, 1.0),
                )
                .float(0.5)
                .into(),
            ),
            (
                "max-pending-channels",
                number(
                    "Maximum Pending Channels",
                    "The maximum number of incoming pending channels permitted per peer.",
                    NumRange::at_least(0.0),
                )
                .int(5)
                .into(),
            ),
            (
                "max-commit-fee-rate-anchors",
                number(
                    "Maximum Commitment Fee for Anchor Channels",
                    "The maximum fee rate in sat/vbyte that will be used for commitments of channels of the anchors type. Must be\nlarge enough to ensure transaction propagation.\n",
                    NumRange::at_least(1.0),
                )
                .int(100)
                .into(),
            ),
            (
                "protocol-wumbo-channels",
                boolean(
                    "Enable Wumbo Channels",
                    "If set, then lnd will create and accept requests for channels larger than 0.16 BTC\n",
                    false,
                ),
            ),
            (
                "protocol-zero-conf",
                with_warning(
                    boolean(
                        "Enable zero-conf Channels",
                        "Set to enable support for zero-conf channels. This requires the option-scid-alias flag to also be set.\n",
                        false,
                    ),
                    "Zero-conf channels are channels that do not require confirmations to be used. Because of this, the fundee must trust the funder to not double-spend the channel and steal the balance of the channel.",
                ),
            ),
            (
                "protocol-option-scid-alias",
                boolean(
                    "Enable option-scid-alias Channels",
                    "Set to enable support for option_scid_alias channels, which can be referred to by an alias instead of the confirmed ShortChannelID. Additionally, is needed to open zero-conf channels.\n",
                    false,
                ),
            ),
            (
                "protocol-no-anchors",
                boolean(
                    "Disable Anchor Channels",
                    "Set to disable support for anchor commitments. Anchor channels allow you to determine your fees at close time by\nusing a Child Pays For Parent transaction.\n",
                    false,
                ),
            ),
            (
                "protocol-disable-script-enforced-lease",
                boolean(
                    "Disable Script Enforced Channel Leases",
                    "Set to disable support for script enforced lease channel commitments. If not set, lnd will accept these channels by default if the remote channel party proposes them. Note that lnd will require 1 UTXO to be reserved for this channel type if it is enabled.\nNote: This may cause you to be unable to close a channel and your wallets may not understand why",
                    false,
                ),
            ),
            (
                "protocol-simple-taproot-chans",
                boolean(
                    "Experimental Taproot Channels",
                    "Taproot Channels improve both privacy and cost efficiency of on-chain transactions. Note: Taproot Channels are experimental and only available for unannounced (private) channels at this time.",
                    false,
                ),
            ),
            (
                "gc-canceled-invoices-on-startup",
                boolean(
                    "Cleanup Canceled Invoices on Startup",
                    "If true, LND will attempt to garbage collect canceled invoices upon start.\n",
                    false,
                ),
            ),
            (
                "allow-circular-route",
                boolean(
                    "Allow Circular Route",
                    "If true, LND will allow htlc forwards that arrive and depart on the same channel.\n",
                    false,
                ),
            ),
            ("bitcoin", bitcoin_channels()),
            ("sweeper", sweeper()),
        ]),
    )
}

fn bitcoin_channels() -> ValueSpec {
    object(
        "Bitcoin Channel Configuration",
        "Configuration options for lightning network channel management operating over the Bitcoin network",
        Ordered(vec![
            (
                "default-channel-confirmations",
                number(
                    "Default Channel Confirmations",
                    "The default number of confirmations a channel must have before it's considered\nopen. LND will require any incoming channel requests to wait this many\nconfirmations before it considers the channel active.\n",
                    NumRange::closed(1.0, 6.0),
                )
                .int(3)
                .units("blocks")
                .into(),
            ),
            (
                "min-htlc",
                number(
                    "Minimum Incoming HTLC Size",
                    "The smallest HTLC LND will to accept on your channels, in millisatoshis.\n",
                    NumRange::at_least(1.0),
                )
                .int(1)
                .units("millisatoshis")
                .into(),
            ),
            (
                "min-htlc-out",
                number(
                    "Minimum Outgoing HTLC Size",
                    "The smallest HTLC LND will send out on your channels, in millisatoshis.\n",
                    NumRange::at_least(1.0),
                )
                .int(1000)
                .units("millisatoshis")
                .into(),
            ),
            (
                "base-fee",
                number(
                    "Routing Base Fee",
                    "The base fee in millisatoshi you will charge for forwarding payments on your\nchannels.\n",
                    NumRange::at_least(0.0),
                )
                .int(1000)
                .units("millisatoshi")
                .into(),
            ),
            (
                "fee-rate",
                number(
                    "Routing Fee Rate",
                    "The fee rate used when forwarding payments on your channels. The total fee\ncharged is the Base Fee + (amount * Fee Rate / 1000000), where amount is the\nforwarded amount. Measured in sats per million\n",
                    NumRange::half_open(1.0, 1_000_000.0),
                )
                .int(1)
                .units("sats per million")
                .into(),
            ),
            (
                "time-lock-delta",
                number(
                    "Time Lock Delta",
                    "The CLTV delta we will subtract from a forwarded HTLC's timelock value.",
                    NumRange::closed(6.0, 144.0),
                )
                .int(40)
                .units("blocks")
                .into(),
            ),
        ]),
    )
}

fn sweeper() -> ValueSpec {
    object(
        "Sweeper Options",
        SWEEPER_DESCRIPTION,
        Ordered(vec![
            (
                "sweeper-maxfeerate",
                number(
                    "Max Fee Rate",
                    "The max fee rate in sat/vb which can be used when sweeping funds. Setting this value too low can result in transactions not being confirmed in time, causing HTLCs to expire hence potentially losing funds.",
                    NumRange::at_least(1.0),
                )
                .int(1000)
                .units("Sats/vb")
                .into(),
            ),
            (
                "sweeper-nodeadlineconftarget",
                number(
                    "Non-time-sensitive Sweep Confirmation Target",
                    "The conf target to use when sweeping non-time-sensitive outputs. This is useful for sweeping outputs that are not time-sensitive, and can be swept at a lower fee rate.",
                    NumRange::at_least(1.0),
                )
                .int(1008)
                .units("Confirmations")
                .into(),
            ),
            (
                "sweeper-budget-tolocalratio",
                number(
                    "Budget to Local Ratio",
                    "The ratio (expressed as a decimal) of the value in to_local output to allocate as the budget to pay fees when sweeping it.",
                    NumRange::half_open(0.0, 1.0),
                )
                .float(0.5)
                .into(),
            ),
            (
                "sweeper-budget-anchorcpfpratio",
                number(
                    "Anchor CPFP Ratio",
                    "The ratio of a special value to allocate as the budget to pay fees when CPFPing a force close tx using the anchor output. The special value is the sum of all time-sensitive HTLCs on this commitment subtracted by their budgets.",
                    NumRange::half_open(0.0, 1.0),
                )
                .float(0.5)
                .into(),
            ),
            (
                "sweeper-budget-deadlinehtlcratio",
                number(
                    "Time-Sensitive HTLC Budget Ratio",
                    "The ratio of the value in a time-sensitive (first-level) HTLC to allocate as the budget to pay fees when sweeping it.",
                    NumRange::half_open(0.0, 1.0),
                )
                .float(0.5)
                .into(),
            ),
            (
                "sweeper-budget-nodeadlinehtlcratio",
                number(
                    "Non-Time-Sensitive HTLC Budget Ratio",
                    "The ratio of the value in a non-time-sensitive (second-level) HTLC to allocate as the budget to pay fees when sweeping it.",
                    NumRange::half_open(0.0, 1.0),
                )
                .float(0.5)
                .into(),
            ),
        ]),
    )
}

/// Deterministic generator for tests that need a default record.
#[cfg(test)]
pub(crate) fn seeded_rng(seed: u64) -> rand::rngs::StdRng {
    use rand::SeedableRng;
    rand::rngs::StdRng::seed_from_u64(seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn defaults() -> Value {
        CATALOGUE.default_record(&mut seeded_rng(7))
    }

    #[test]
    fn default_record_passes_its_own_validation() {
        let record = defaults();
        assert_eq!(CATALOGUE.validate(&record), vec![]);
        assert!(crate::schema::root().test(&record));
    }

    #[test]
    fn default_record_carries_declared_values() {
        let record = defaults();
        assert_eq!(record["accept-keysend"], json!(true));
        assert_eq!(record["bitcoind"], json!({ "type": "internal" }));
        assert_eq!(record["watchtowers"]["wt-client"], json!({ "enabled": "disabled" }));
        assert_eq!(record["advanced"]["max-pending-channels"], json!(5));
        assert_eq!(record["autopilot"]["allocation"], json!(60));
        assert_eq!(record["advanced"]["sweeper"]["sweeper-budget-tolocalratio"], json!(0.5));
        assert_eq!(record["advanced"]["recovery-window"], Value::Null);
        assert_eq!(record["alias"], Value::Null);
        assert!(record.get("control-tor-address").is_none());
    }

    #[test]
    fn generated_color_uses_declared_charset() {
        for seed in 0..20 {
            let record = CATALOGUE.default_record(&mut seeded_rng(seed));
            let color = record["color"].as_str().unwrap();
            assert_eq!(color.len(), 6);
            assert!(color.chars().all(|c| matches!(c, 'a'..='f' | '0'..='9')));
        }
    }

    #[test]
    fn charset_expansion() {
        assert_eq!(expand_charset("a-c,0-2"), vec!['a', 'b', 'c', '0', '1', '2']);
        assert_eq!(expand_charset("x,y"), vec!['x', 'y']);
    }

    #[test]
    fn range_notation_round_trips() {
        for s in ["[1,16777215]", "[1,*)", "[0,1)", "[0.1,1]", "(0,5]"] {
            let r: NumRange = s.parse().unwrap();
            assert_eq!(r.to_string(), s);
        }
        let spaced: NumRange = "[6, 144]".parse().unwrap();
        assert_eq!(spaced, NumRange::closed(6.0, 144.0));
        assert!("1,2".parse::<NumRange>().is_err());
        assert!("[a,2]".parse::<NumRange>().is_err());
    }

    #[test]
    fn range_bounds() {
        let r = NumRange::half_open(0.0, 1.0);
        assert!(r.contains(0.0));
        assert!(r.contains(0.99));
        assert!(!r.contains(1.0));
        assert!(NumRange::at_least(1.0).contains(1e12));
        assert!(!NumRange::at_least(1.0).contains(0.0));
    }

    #[test]
    fn reports_range_integral_and_pattern_errors() {
        let mut record = defaults();
        record["color"] = json!("zzzzzz");
        record["advanced"]["default-remote-max-htlcs"] = json!(484);
        record["autopilot"]["maxchannels"] = json!(2.5);
        record["advanced"]["debug-level"] = json!("loud");

        let paths: Vec<String> = CATALOGUE
            .validate(&record)
            .into_iter()
            .map(|e| e.path)
            .collect();
        assert_eq!(
            paths,
            vec![
                "color",
                "autopilot.maxchannels",
                "advanced.debug-level",
                "advanced.default-remote-max-htlcs",
            ]
        );
    }

    #[test]
    fn missing_required_field_is_reported() {
        let mut record = defaults();
        record["advanced"].as_object_mut().unwrap().remove("sweeper");
        let errors = CATALOGUE.validate(&record);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "advanced.sweeper: is required");
    }

    #[test]
    fn union_variant_fields_are_checked() {
        let mut record = defaults();
        record["watchtowers"]["wt-client"] = json!({ "enabled": "enabled", "add-watchtowers": [] });
        let errors = CATALOGUE.validate(&record);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "watchtowers.wt-client.add-watchtowers");

        record["watchtowers"]["wt-client"] = json!({ "enabled": "maybe" });
        let errors = CATALOGUE.validate(&record);
        assert_eq!(errors[0].path, "watchtowers.wt-client.enabled");
        assert!(errors[0].message.contains("unknown variant 'maybe'"));

        record["bitcoind"] = json!({ "type": "none" });
        record["watchtowers"]["wt-client"] = json!({ "enabled": "disabled" });
        assert_eq!(CATALOGUE.validate(&record), vec![]);
    }

    #[test]
    fn serializes_in_host_dialect() {
        let json = serde_json::to_value(&*CATALOGUE).unwrap();
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert!(keys.contains(&&"advanced".to_string()));

        let fee_rate = &json["advanced"]["spec"]["bitcoin"]["spec"]["fee-rate"];
        assert_eq!(fee_rate["type"], "number");
        assert_eq!(fee_rate["range"], "[1,1000000)");
        assert_eq!(fee_rate["integral"], true);
        assert_eq!(fee_rate["default"], 1);

        let allocation = &json["autopilot"]["spec"]["allocation"];
        assert_eq!(allocation["integral"], false);
        assert!(allocation["default"].is_u64());
        assert_eq!(allocation["default"].to_string(), "60");

        let color = &json["color"];
        assert_eq!(color["default"], json!({ "charset": "a-f,0-9", "len": 6 }));

        let wt_client = &json["watchtowers"]["spec"]["wt-client"];
        assert_eq!(wt_client["type"], "union");
        assert_eq!(wt_client["tag"]["id"], "enabled");
        assert_eq!(wt_client["tag"]["variant-names"]["enabled"], "Enabled");
        assert_eq!(
            wt_client["variants"]["enabled"]["add-watchtowers"]["spec"]["placeholder"],
            "pubkey@host:9911"
        );

        let user = &json["bitcoind"]["variants"]["internal"]["user"];
        assert_eq!(user["type"], "pointer");
        assert_eq!(user["package-id"], "bitcoind");
        assert_eq!(user["selector"], "$.rpc.username");
    }

    #[test]
    fn current_catalogue_has_no_tor_section() {
        assert!(CATALOGUE.get("tor").is_none());
    }
}
