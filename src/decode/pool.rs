use std::cell::RefCell;

use crate::decode::Parser;
use crate::types::value::Value;

thread_local! {
    static HANDY_PARSER: RefCell<Parser> = RefCell::new(Parser::new());
}

fn take_parser() -> Parser {
    HANDY_PARSER.with(|cell| std::mem::take(&mut *cell.borrow_mut()))
}

fn put_parser(parser: Parser) {
    HANDY_PARSER.with(|cell| *cell.borrow_mut() = parser);
}

/// Parses `data` with this thread's cached parser and hands the root to `f`.
/// Returns `None` when `data` does not parse.
pub(crate) fn with_parsed<R>(data: &[u8], f: impl FnOnce(Value<'_>) -> R) -> Option<R> {
    let mut parser = take_parser();
    let result = parser.parse_bytes(data).ok().map(f);
    parser.reset();
    put_parser(parser);
    result
}
