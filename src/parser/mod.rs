//! 弹幕源数据解析器。
//!
//! 把 Bilibili XML 与 AcFun JSON 两种上游格式规范化为 [`Comment`] 列表，
//! 并按 (时间戳, 序号) 排好序交给生成器。单条弹幕的数据问题只记录警告
//! 并跳过，不中断整个文档；只有文档本身不可读（XML 格式错误、JSON 根
//! 结构不符）才返回错误。

mod acfun;
mod bilibili;

pub use acfun::parse_acfun;
pub use bilibili::parse_bilibili;

use serde_json::Value;
use unicode_segmentation::UnicodeSegmentation as _;

use crate::types::Comment;

/// 按 (时间戳, 序号) 升序排序。
///
/// 序号是弹幕在源文档中的出现位置，保证同一时刻的弹幕维持文档顺序。
fn sort_comments(comments: &mut [Comment]) {
    comments.sort_by(|a, b| {
        a.timestamp
            .total_cmp(&b.timestamp)
            .then_with(|| a.sequence.cmp(&b.sequence))
    });
}

/// 弹幕文本的显示宽度，以最宽一行的字素数计。
fn display_length(text: &str) -> usize {
    text.split('\n')
        .map(|line| line.graphemes(true).count())
        .max()
        .unwrap_or(0)
}

fn parse_int_like(text: &str) -> Option<i64> {
    text.trim().parse().ok()
}

fn parse_float_like(text: &str) -> Option<f64> {
    text.trim().parse().ok()
}

/// 宽松的整数转换。数字截断取整，字符串按十进制解析，布尔值按 0/1 处理。
fn json_to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float as i64)),
        Value::String(text) => parse_int_like(text),
        Value::Bool(flag) => Some(i64::from(*flag)),
        _ => None,
    }
}

/// 宽松的浮点数转换，接受数字、数字字符串和布尔值。
fn json_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => parse_float_like(text),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// 宽松的字符串转换。null、数组和对象没有有意义的文本形式，返回 `None`。
fn json_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// JSON 值的真值判断：0、空串、空容器、null 和 false 为假。
fn json_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|float| float != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
