pub mod filter_where;

pub use filter_where::FilterWhere;
