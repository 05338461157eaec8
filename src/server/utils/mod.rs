pub mod natural_sort;
pub mod validation;

pub use natural_sort::{natural_cmp, natural_key, sort_naturally, NaturalKey};
