// Submodules for separation of concerns
mod compile;
mod parse;
mod types;

pub use compile::{build_query, compile, compile_parts, translate_condition};
pub use parse::{parse_filter_json, parse_request_json, request_from_value};
pub use types::{
    AndGroup, CompiledQuery, Condition, Direction, Filter, NativeOptions, Operator, Request,
    SortSpec,
};
