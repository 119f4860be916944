//! Mergeable field tables.
//!
//! Every task and result declares its mergeable fields statically instead of
//! relying on runtime reflection. The [`mergeable!`](crate::mergeable) macro
//! generates the [`Fields`] implementation from a field list; values cross
//! the table as [`serde_json::Value`].

pub mod merge;

pub use merge::{merge_object, MergeOptions, MergeSource};

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Named dynamic fields exchanged between tasks, results and argument bags.
pub type FieldMap = serde_json::Map<String, Value>;

/// Names that never travel the free-form overflow path.
pub(crate) const RESERVED_FIELDS: &[&str] = &["state", "result"];

/// A set of named fields that can be read and written dynamically.
///
/// The field table is a per-type constant: `field_names` lists the declared,
/// mergeable fields and `merge_exclusions` the names the merge engine must
/// never touch. Internal bookkeeping (the result slot, propagation flags)
/// is simply not listed, which keeps it out of every merge.
pub trait Fields {
    /// Names of the declared fields, in declaration order.
    fn field_names(&self) -> &'static [&'static str];

    /// Read a declared field as a dynamic value.
    fn field(&self, name: &str) -> Option<Value>;

    /// Write a declared field from a dynamic value.
    ///
    /// Returns `true` when the name is declared and the value was applied.
    /// Incompatible values are dropped with a warning rather than failing
    /// the whole merge.
    fn set_field(&mut self, name: &str, value: Value) -> bool;

    /// Field names the merge engine must never touch on this type.
    fn merge_exclusions(&self) -> &'static [&'static str] {
        &[]
    }

    /// Free-form overflow map, for types that accumulate undeclared fields.
    fn state(&self) -> Option<&FieldMap> {
        None
    }

    /// Mutable access to the overflow map, allocating it on first use.
    /// `None` for declared-fields-only types.
    fn state_mut(&mut self) -> Option<&mut FieldMap> {
        None
    }
}

/// Deserialize `value` into `T`, retrying a bare scalar as a one-element
/// list so list-typed fields accept single argument values.
pub fn coerce<T: DeserializeOwned>(value: Value) -> Result<T, serde_json::Error> {
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Ok(parsed),
        Err(err) if !value.is_array() => {
            serde_json::from_value(Value::Array(vec![value])).map_err(|_| err)
        }
        Err(err) => Err(err),
    }
}

/// Declare the mergeable field table for a type.
///
/// ```
/// use taskpipe::{mergeable, FieldMap};
///
/// #[derive(Debug, Default)]
/// struct Sample {
///     foo: String,
///     color: String,
///     state: Option<FieldMap>,
/// }
///
/// // Declared fields, a permanent merge exclusion, and a free-form
/// // overflow map for undeclared names.
/// mergeable!(Sample { foo, color } except [color] state state);
/// ```
///
/// The `except [...]` and `state <field>` clauses are optional. The state
/// field must be an `Option<FieldMap>`; it is allocated on first use.
#[macro_export]
macro_rules! mergeable {
    (@impl $ty:ty, [$($field:ident),*], [$($ex:ident),*], ($($state:ident)?)) => {
        impl $crate::state::Fields for $ty {
            fn field_names(&self) -> &'static [&'static str] {
                &[$(stringify!($field)),*]
            }

            fn field(&self, name: &str) -> ::std::option::Option<$crate::Value> {
                match name {
                    $(
                        stringify!($field) => {
                            $crate::__private::serde_json::to_value(&self.$field).ok()
                        }
                    )*
                    _ => ::std::option::Option::None,
                }
            }

            #[allow(unused_variables)]
            fn set_field(&mut self, name: &str, value: $crate::Value) -> bool {
                match name {
                    $(
                        stringify!($field) => match $crate::state::coerce(value) {
                            ::std::result::Result::Ok(parsed) => {
                                self.$field = parsed;
                                true
                            }
                            ::std::result::Result::Err(err) => {
                                $crate::__private::tracing::warn!(
                                    field = name,
                                    %err,
                                    "dropping incompatible value during merge"
                                );
                                false
                            }
                        },
                    )*
                    _ => false,
                }
            }

            fn merge_exclusions(&self) -> &'static [&'static str] {
                &[$(stringify!($ex)),*]
            }

            $(
                fn state(&self) -> ::std::option::Option<&$crate::FieldMap> {
                    self.$state.as_ref()
                }

                fn state_mut(&mut self) -> ::std::option::Option<&mut $crate::FieldMap> {
                    ::std::option::Option::Some(
                        self.$state.get_or_insert_with($crate::FieldMap::new),
                    )
                }
            )?
        }
    };
    ($ty:ty { $($field:ident),* $(,)? }) => {
        $crate::mergeable!(@impl $ty, [$($field),*], [], ());
    };
    ($ty:ty { $($field:ident),* $(,)? } except [$($ex:ident),* $(,)?]) => {
        $crate::mergeable!(@impl $ty, [$($field),*], [$($ex),*], ());
    };
    ($ty:ty { $($field:ident),* $(,)? } state $state:ident) => {
        $crate::mergeable!(@impl $ty, [$($field),*], [], ($state));
    };
    ($ty:ty { $($field:ident),* $(,)? } except [$($ex:ident),* $(,)?] state $state:ident) => {
        $crate::mergeable!(@impl $ty, [$($field),*], [$($ex),*], ($state));
    };
}
