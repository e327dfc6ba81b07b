//! Validator registry and field validation.
//!
//! A validator is a pure function from a field value (possibly absent) to
//! an error message, `None` meaning the value is acceptable. Validators are
//! registered by name in an explicit [`ValidatorRegistry`] passed into the
//! reducer factory; there is no ambient global table.

use crate::path::{Path, encode_name};
use crate::state::FormState;
use crate::structure::Structure;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A named or inline validator: `Some(message)` rejects the value.
pub type ValidatorFn<V> = Arc<dyn Fn(Option<&V>) -> Option<String> + Send + Sync>;

/// Reference to a validator in a declaration: by registry name or inline.
#[derive(Clone)]
pub enum ValidatorSource<V> {
    Named(String),
    Func(ValidatorFn<V>),
}

impl<V> fmt::Debug for ValidatorSource<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidatorSource::Named(name) => f.debug_tuple("Named").field(name).finish(),
            ValidatorSource::Func(_) => f.write_str("Func(<fn>)"),
        }
    }
}

/// One entry of a field's validation declaration. Three shapes are
/// accepted; all normalize to [`FieldValidator`].
#[derive(Clone)]
pub enum ValidationRule<V> {
    /// Bare registry name; the validator's own message is used.
    Name(String),
    /// Bare function; same message rule.
    Func(ValidatorFn<V>),
    /// Explicit override message, winning over the validator's own message.
    WithMessage { func: ValidatorSource<V>, msg: String },
}

impl<V> ValidationRule<V> {
    pub fn name(name: impl Into<String>) -> Self {
        ValidationRule::Name(name.into())
    }

    pub fn func(f: impl Fn(Option<&V>) -> Option<String> + Send + Sync + 'static) -> Self {
        ValidationRule::Func(Arc::new(f))
    }

    pub fn named_with_msg(name: impl Into<String>, msg: impl Into<String>) -> Self {
        ValidationRule::WithMessage {
            func: ValidatorSource::Named(name.into()),
            msg: msg.into(),
        }
    }

    pub fn func_with_msg(
        f: impl Fn(Option<&V>) -> Option<String> + Send + Sync + 'static,
        msg: impl Into<String>,
    ) -> Self {
        ValidationRule::WithMessage {
            func: ValidatorSource::Func(Arc::new(f)),
            msg: msg.into(),
        }
    }
}

impl<V> fmt::Debug for ValidationRule<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationRule::Name(name) => f.debug_tuple("Name").field(name).finish(),
            ValidationRule::Func(_) => f.write_str("Func(<fn>)"),
            ValidationRule::WithMessage { func, msg } => f
                .debug_struct("WithMessage")
                .field("func", func)
                .field("msg", msg)
                .finish(),
        }
    }
}

/// A normalized validator entry stored in the validations table.
#[derive(Clone)]
pub struct FieldValidator<V> {
    pub func: ValidatorFn<V>,
    /// Override message; wins over the validator's returned message when
    /// both are present.
    pub msg: Option<String>,
}

impl<V> fmt::Debug for FieldValidator<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldValidator")
            .field("func", &"<fn>")
            .field("msg", &self.msg)
            .finish()
    }
}

impl<V> PartialEq for FieldValidator<V> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.func, &other.func) && self.msg == other.msg
    }
}

/// Named validator table, constructed once and passed into the reducer
/// factory by reference.
pub struct ValidatorRegistry<V> {
    table: HashMap<String, ValidatorFn<V>>,
}

impl<V> Default for ValidatorRegistry<V> {
    fn default() -> Self {
        ValidatorRegistry {
            table: HashMap::new(),
        }
    }
}

impl<V> ValidatorRegistry<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(Option<&V>) -> Option<String> + Send + Sync + 'static,
    ) {
        self.table.insert(name.into(), Arc::new(f));
    }

    pub fn get(&self, name: &str) -> Option<&ValidatorFn<V>> {
        self.table.get(name)
    }

    /// Resolve a name to a validator. Unknown names resolve to a no-op
    /// validator that accepts every value; a misspelled declaration must
    /// not reject anything.
    pub fn resolve(&self, name: &str) -> ValidatorFn<V>
    where
        V: 'static,
    {
        match self.table.get(name) {
            Some(f) => Arc::clone(f),
            None => noop_validator(),
        }
    }

    /// Normalize a validation declaration into the stored form.
    pub fn normalize(&self, rules: &[ValidationRule<V>]) -> Vec<FieldValidator<V>>
    where
        V: 'static,
    {
        rules
            .iter()
            .map(|rule| match rule {
                ValidationRule::Name(name) => FieldValidator {
                    func: self.resolve(name),
                    msg: None,
                },
                ValidationRule::Func(f) => FieldValidator {
                    func: Arc::clone(f),
                    msg: None,
                },
                ValidationRule::WithMessage { func, msg } => FieldValidator {
                    func: match func {
                        ValidatorSource::Named(name) => self.resolve(name),
                        ValidatorSource::Func(f) => Arc::clone(f),
                    },
                    msg: Some(msg.clone()),
                },
            })
            .collect()
    }
}

fn noop_validator<V: 'static>() -> ValidatorFn<V> {
    Arc::new(|_| None)
}

// ─── Field validation runner ────────────────────────────────────────────────

/// Run the field's registered validators against its current value and
/// rewrite its sync-error slot. First failing validator wins; remaining
/// validators are skipped. A field with no registered validation is left
/// untouched.
pub(crate) fn run_field_validation<S: Structure>(
    structure: &S,
    state: &mut FormState<S::Value>,
    name: &str,
) {
    let Some(validators) = state.validations.get(&encode_name(name)) else {
        return;
    };
    let validators = validators.clone();

    let path = Path::parse_lenient(name);
    let value = structure.get_in(&state.values, &path);
    state.sync_errors = structure.delete_in_with_cleanup(&state.sync_errors, &path);

    for validator in &validators {
        let returned = (validator.func)(value.as_ref());
        let message = match (&returned, &validator.msg) {
            (Some(_), Some(overridden)) => Some(overridden.clone()),
            _ => returned,
        };
        if let Some(message) = message {
            state.sync_errors =
                structure.set_in(&state.sync_errors, &path, structure.from_str(&message));
            break;
        }
    }
}

/// Drop the field's sync error, cleaning up emptied ancestors.
pub(crate) fn clear_sync_error<S: Structure>(
    structure: &S,
    state: &mut FormState<S::Value>,
    name: &str,
) {
    state.sync_errors =
        structure.delete_in_with_cleanup(&state.sync_errors, &Path::parse_lenient(name));
}

// ─── Built-in validators (serde_json backend) ───────────────────────────────

/// Built-in validators for the plain backend: `required`, `ipv4`, `ipv6`,
/// `netmask`. All but `required` accept an absent or null value; pair them
/// with `required` to reject missing input.
#[cfg(feature = "builtin-validators")]
pub mod builtin {
    use super::{ValidatorFn, ValidatorRegistry};
    use regex::Regex;
    use serde_json::Value;
    use std::sync::Arc;

    /// Registry preloaded with the built-in validators.
    pub fn registry() -> ValidatorRegistry<Value> {
        let mut registry = ValidatorRegistry::new();
        registry.table.insert("required".to_string(), required());
        registry.table.insert("ipv4".to_string(), ipv4());
        registry.table.insert("ipv6".to_string(), ipv6());
        registry.table.insert("netmask".to_string(), netmask());
        registry
    }

    /// Rejects absent, null, and empty-string values.
    pub fn required() -> ValidatorFn<Value> {
        Arc::new(|value| match value {
            None | Some(Value::Null) => Some("required".to_string()),
            Some(Value::String(s)) if s.is_empty() => Some("required".to_string()),
            _ => None,
        })
    }

    /// Dotted-quad IPv4 address with in-range octets.
    pub fn ipv4() -> ValidatorFn<Value> {
        Arc::new(|value| {
            string_check(value, "invalid IPv4 address", |s| {
                let Ok(re) = Regex::new(r"^(\d{1,3})\.(\d{1,3})\.(\d{1,3})\.(\d{1,3})$") else {
                    return false;
                };
                match re.captures(s) {
                    Some(caps) => (1..=4).all(|i| {
                        caps.get(i)
                            .and_then(|m| m.as_str().parse::<u16>().ok())
                            .is_some_and(|octet| octet <= 255)
                    }),
                    None => false,
                }
            })
        })
    }

    /// IPv6 address in any standard textual form.
    pub fn ipv6() -> ValidatorFn<Value> {
        Arc::new(|value| {
            string_check(value, "invalid IPv6 address", |s| {
                s.parse::<std::net::Ipv6Addr>().is_ok()
            })
        })
    }

    /// Prefix-length (`/0`–`/32`) or dotted-quad netmask with contiguous
    /// leading ones.
    pub fn netmask() -> ValidatorFn<Value> {
        Arc::new(|value| {
            string_check(value, "invalid netmask", |s| {
                let Ok(prefix) = Regex::new(r"^/(\d{1,2})$") else {
                    return false;
                };
                if let Some(caps) = prefix.captures(s) {
                    return caps
                        .get(1)
                        .and_then(|m| m.as_str().parse::<u8>().ok())
                        .is_some_and(|bits| bits <= 32);
                }
                match s.parse::<std::net::Ipv4Addr>() {
                    Ok(addr) => {
                        let bits = u32::from(addr);
                        // contiguous ones: 0b111..1000..0
                        bits.leading_ones() + bits.trailing_zeros() == 32
                    }
                    Err(_) => false,
                }
            })
        })
    }

    fn string_check(
        value: Option<&Value>,
        message: &str,
        ok: impl Fn(&str) -> bool,
    ) -> Option<String> {
        match value {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => {
                if ok(s) {
                    None
                } else {
                    Some(message.to_string())
                }
            }
            Some(_) => Some(message.to_string()),
        }
    }

}
