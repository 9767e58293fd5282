/// Declares `default_<name>` and `is_default_<name>` for use in `#[serde(...)]`
/// attributes.
macro_rules! serde_default {
    ($name:ident, $ty:ty, $val:expr) => {
        ::paste::paste! {
            fn [<default_ $name>]() -> $ty { $val }
            fn [<is_default_ $name>](v: &$ty) -> bool { *v == [<default_ $name>]() }
        }
    };
}

pub(crate) use serde_default;

pub(crate) fn is_zero_f32(value: &f32) -> bool {
    *value == 0.0
}

pub(crate) fn is_one_f32(value: &f32) -> bool {
    *value == 1.0
}

pub(crate) fn default_one_f32() -> f32 {
    1.0
}
