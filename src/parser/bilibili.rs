//! Bilibili XML 弹幕解析。
//!
//! 上游文档由一连串 `<d p="...">文本</d>` 元素构成，`p` 属性是逗号分隔的
//! 参数表，依次为出现时间、模式、字号、颜色、发布时间等。mode 7 弹幕的
//! 元素文本本身又是一段 JSON 数组，描述一次 from → to 的定位动画。

use std::str;

use quick_xml::Reader;
use quick_xml::events::Event;
use serde_json::Value;
use tracing::{error, warn};

use crate::error::ConvertError;
use crate::types::{
    BiliCoordinate, BiliPositionedPayload, Comment, CommentMode, PositionedPayload,
};

use super::{
    display_length, json_to_f64, json_to_i64, json_to_string, json_truthy, parse_float_like,
    parse_int_like, sort_comments,
};

/// 解析 Bilibili XML 弹幕文档。
///
/// `font_size` 是基准字号，每条弹幕的字号参数按 25 号字的比例缩放到这个
/// 基准上。单条弹幕的数据问题（参数不足、数字不合法、载荷损坏）记录警告
/// 并跳过，不影响其余弹幕。
///
/// # Errors
///
/// XML 文档本身不可解析（标签不匹配、属性语法错误、编码问题）时返回错误。
pub fn parse_bilibili(content: &str, font_size: f64) -> Result<Vec<Comment>, ConvertError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(false);
    reader.config_mut().expand_empty_elements = true;

    let mut comments: Vec<Comment> = Vec::with_capacity(content.matches("<d").count());
    // (p 属性, 累积的元素文本)。文本为 None 表示元素里还没有出现过文本节点
    let mut current: Option<(String, Option<String>)> = None;
    let mut sequence = 0_usize;
    let mut buf = Vec::new();

    loop {
        let event = match reader.read_event_into(&mut buf) {
            Ok(event) => event,
            Err(e) => {
                error!(
                    "XML 解析错误，位置 {}: {e}。无法继续解析",
                    reader.error_position()
                );
                return Err(ConvertError::Xml(e));
            }
        };

        match event {
            Event::Start(e) if e.local_name().as_ref() == b"d" => {
                let params = match e.try_get_attribute(b"p")? {
                    Some(attr) => attr
                        .decode_and_unescape_value(reader.decoder())?
                        .into_owned(),
                    None => String::new(),
                };
                current = Some((params, None));
            }
            Event::Text(e) => {
                if let Some((_, text)) = current.as_mut() {
                    text.get_or_insert_default()
                        .push_str(&e.xml_content().map_err(ConvertError::new_parse)?);
                }
            }
            Event::CData(e) => {
                if let Some((_, text)) = current.as_mut() {
                    text.get_or_insert_default().push_str(&e.decode()?);
                }
            }
            Event::GeneralRef(e) => {
                if let Some((_, text)) = current.as_mut() {
                    let entity_name = str::from_utf8(e.as_ref()).map_err(|err| {
                        ConvertError::Internal(format!("无法将实体名解码为UTF-8: {err}"))
                    })?;
                    let decoded_char = decode_entity(entity_name);
                    if decoded_char != '\0' {
                        text.get_or_insert_default().push(decoded_char);
                    }
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"d" => {
                if let Some((params, text)) = current.take() {
                    // 没有文本节点的空元素静默跳过，但仍占一个序号
                    if let Some(comment) =
                        text.and_then(|text| build_comment(&params, &text, sequence, font_size))
                    {
                        comments.push(comment);
                    }
                    sequence += 1;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    sort_comments(&mut comments);
    Ok(comments)
}

/// 解码 XML 通用实体引用，无法识别时返回 `'\0'` 哨兵。
fn decode_entity(entity_name: &str) -> char {
    if let Some(num_str) = entity_name.strip_prefix('#') {
        let (radix, code_point_str) = num_str
            .strip_prefix('x')
            .map_or((10, num_str), |stripped| (16, stripped));

        u32::from_str_radix(code_point_str, radix).map_or_else(
            |_| {
                warn!("无法解析无效的XML数字实体 '&{entity_name};'");
                '\0'
            },
            |code_point| char::from_u32(code_point).unwrap_or('\0'),
        )
    } else {
        match entity_name {
            "amp" => '&',
            "lt" => '<',
            "gt" => '>',
            "quot" => '"',
            "apos" => '\'',
            _ => {
                warn!("忽略了未知的XML实体 '&{entity_name};'");
                '\0'
            }
        }
    }
}

/// 把一条 `<d>` 元素规范化为 [`Comment`]，数据不合法时记录警告并丢弃。
fn build_comment(params: &str, text: &str, sequence: usize, font_size: f64) -> Option<Comment> {
    let fields: Vec<&str> = params.split(',').collect();
    if fields.len() < 5 {
        warn!("跳过参数不足的弹幕: p='{params}'");
        return None;
    }
    if fields[1] == "8" {
        // 脚本弹幕，静默忽略
        return None;
    }

    let comment = normalize_comment(&fields, text, sequence, font_size);
    if comment.is_none() {
        warn!("跳过无法解析的弹幕: p='{params}'");
    }
    comment
}

fn normalize_comment(
    fields: &[&str],
    text: &str,
    sequence: usize,
    font_size: f64,
) -> Option<Comment> {
    let timestamp = parse_float_like(fields[0]).filter(|t| t.is_finite())?;
    // 发布时间只做合法性校验，不参与排序
    parse_int_like(fields[4])?;
    let color = parse_int_like(fields[3])? as u32;
    let user_size = parse_int_like(fields[2])? as f64;

    match fields[1] {
        "1" | "4" | "5" | "6" => {
            let mode = match fields[1] {
                "1" => CommentMode::Scroll,
                "4" => CommentMode::BottomStatic,
                "5" => CommentMode::TopStatic,
                _ => CommentMode::ScrollReverse,
            };
            let text = text.replace("/n", "\n");
            let rendered_size = user_size * font_size / 25.0;
            let line_count = text.matches('\n').count() + 1;
            Some(Comment {
                timestamp,
                sequence,
                mode,
                color,
                user_size,
                rendered_size,
                block_height: line_count as f64 * rendered_size,
                pixel_width: display_length(&text) as f64 * rendered_size,
                text,
            })
        }
        "7" => {
            let payload = positioned_payload(text)?;
            Some(Comment {
                timestamp,
                sequence,
                text: payload.text.clone(),
                mode: CommentMode::Positioned(PositionedPayload::SingleKeyframe(payload)),
                color,
                user_size,
                // 定位弹幕的字号不随基准字号缩放，渲染时按画布比例缩放
                rendered_size: user_size,
                block_height: 0.0,
                pixel_width: 0.0,
            })
        }
        _ => None,
    }
}

/// 解析 mode 7 弹幕的 JSON 载荷。
fn positioned_payload(raw: &str) -> Option<BiliPositionedPayload> {
    let Ok(Value::Array(args)) = serde_json::from_str::<Value>(raw) else {
        return None;
    };
    // null 与缺项同样取默认值
    let get = |index: usize| args.get(index).filter(|value| !value.is_null());

    let text = json_to_string(get(4)?)?.replace("/n", "\n");
    let from_x = match get(0) {
        Some(value) => coordinate(value)?,
        None => BiliCoordinate::Absolute(0.0),
    };
    let from_y = match get(1) {
        Some(value) => coordinate(value)?,
        None => BiliCoordinate::Absolute(0.0),
    };
    let to_x = match get(7) {
        Some(value) => coordinate(value)?,
        None => from_x,
    };
    let to_y = match get(8) {
        Some(value) => coordinate(value)?,
        None => from_y,
    };

    // 透明度写作 "from-to"，只有一段时 to 跟随 from
    let alpha_spec = match get(2) {
        Some(value) => json_to_string(value)?,
        None => "1".to_string(),
    };
    let mut alpha_parts = alpha_spec.split('-');
    let from_alpha = parse_float_like(alpha_parts.next()?)?;
    let to_alpha = match alpha_parts.next() {
        Some(part) => parse_float_like(part)?,
        None => from_alpha,
    };

    // 生存时间单位是秒，缺省值历史上就是 4500，按原样保留
    let lifetime = match get(3) {
        Some(value) => json_to_f64(value)?,
        None => 4500.0,
    };
    let rotate_z = match get(5) {
        Some(value) => json_to_i64(value)? as f64,
        None => 0.0,
    };
    let rotate_y = match get(6) {
        Some(value) => json_to_i64(value)? as f64,
        None => 0.0,
    };
    let duration = match get(9) {
        Some(value) => json_to_i64(value)?,
        None => (lifetime * 1000.0) as i64,
    };
    let delay = match get(10) {
        Some(value) => json_to_i64(value)?,
        None => 0,
    };
    // 只有字符串 "false" 才关闭边框，布尔值 false 不行
    let border = !matches!(get(11), Some(Value::String(flag)) if flag == "false");
    let fontface = match get(12) {
        None => None,
        Some(Value::String(face)) if face.is_empty() => None,
        Some(Value::String(face)) => Some(face.clone()),
        // 其他真值类型没有合法的字体名形式，整条丢弃
        Some(value) if json_truthy(value) => return None,
        Some(_) => None,
    };

    Some(BiliPositionedPayload {
        text,
        from_x,
        from_y,
        to_x,
        to_y,
        from_alpha,
        to_alpha,
        rotate_z,
        rotate_y,
        lifetime,
        duration,
        delay,
        fontface,
        border,
    })
}

/// 区分绝对坐标与比例坐标。
///
/// 整数一律是绝对像素；浮点数大于 1 的按绝对像素处理，否则按比例处理；
/// 字符串先按整数再按浮点数解析，套用同样的规则。
fn coordinate(value: &Value) -> Option<BiliCoordinate> {
    match value {
        Value::Number(number) => number.as_i64().map_or_else(
            || number.as_f64().map(classify_float),
            |int| Some(BiliCoordinate::Absolute(int as f64)),
        ),
        Value::String(text) => parse_int_like(text).map_or_else(
            || parse_float_like(text).map(classify_float),
            |int| Some(BiliCoordinate::Absolute(int as f64)),
        ),
        Value::Bool(flag) => Some(BiliCoordinate::Absolute(if *flag { 1.0 } else { 0.0 })),
        _ => None,
    }
}

fn classify_float(value: f64) -> BiliCoordinate {
    if value > 1.0 {
        BiliCoordinate::Absolute(value)
    } else {
        BiliCoordinate::Proportional(value)
    }
}
