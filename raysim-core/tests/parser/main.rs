//! Parser tests, grouped by construct

mod test_components;
mod test_expressions;
mod test_let;
mod test_run;
