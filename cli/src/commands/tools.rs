use habitlog_core::tools::tool_definitions;

use crate::util::print_json;

pub fn run() -> i32 {
    print_json(&tool_definitions());
    0
}
