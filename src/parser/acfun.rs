//! AcFun JSON 弹幕解析。
//!
//! 上游文档是一个 JSON 数组，第三个元素才是弹幕列表。每条弹幕是
//! `{"c": "参数表", "m": "文本"}` 形式的对象，参数表依次为出现时间、
//! 颜色、模式、字号、用户标识、发布时间。mode 7 弹幕的 `m` 字段是再
//! 编码过一层的 JSON 对象，描述以关键帧序列表示的动画。

use serde_json::Value;
use tracing::warn;

use crate::error::ConvertError;
use crate::types::{AcfunAction, AcfunPositionedPayload, Comment, CommentMode, PositionedPayload};

use super::{
    display_length, json_to_f64, json_to_i64, json_to_string, json_truthy, parse_float_like,
    parse_int_like, sort_comments,
};

/// 解析 AcFun JSON 弹幕文档。
///
/// `font_size` 是基准字号，弹幕各自的字号参数按 25 号字的比例缩放到
/// 这个基准上。单条弹幕的数据问题记录警告并跳过。
///
/// # Errors
///
/// 文档不是合法 JSON 时返回 [`ConvertError::JsonParse`]；根结构不是
/// 至少三个元素的数组、或第三个元素不是弹幕列表时返回
/// [`ConvertError::InvalidJsonStructure`]。
pub fn parse_acfun(content: &str, font_size: f64) -> Result<Vec<Comment>, ConvertError> {
    let root: Value = serde_json::from_str(content)
        .map_err(|e| ConvertError::json_parse(e, "AcFun 弹幕文档".to_string()))?;
    let Some(items) = root.get(2).and_then(Value::as_array) else {
        return Err(ConvertError::InvalidJsonStructure(
            "AcFun 弹幕文档的第三个元素应当是弹幕列表".to_string(),
        ));
    };

    let mut comments = Vec::with_capacity(items.len());
    for (sequence, item) in items.iter().enumerate() {
        match build_comment(item, sequence, font_size) {
            Some(comment) => comments.push(comment),
            None => warn!("跳过无法解析的弹幕: {item}"),
        }
    }

    sort_comments(&mut comments);
    Ok(comments)
}

/// 把一条弹幕对象规范化为 [`Comment`]，数据不合法时返回 `None`。
fn build_comment(item: &Value, sequence: usize, font_size: f64) -> Option<Comment> {
    let params = json_to_string(item.get("c")?)?;
    let fields: Vec<&str> = params.split(',').collect();
    if fields.len() < 6 {
        return None;
    }

    let timestamp = parse_float_like(fields[0]).filter(|t| t.is_finite())?;
    let color = parse_int_like(fields[1])? as u32;
    let user_size = parse_int_like(fields[3])? as f64;
    // 发布时间只做合法性校验，不参与排序
    parse_int_like(fields[5])?;
    let rendered_size = user_size * font_size / 25.0;

    match fields[2] {
        "1" | "2" | "4" | "5" => {
            let mode = match fields[2] {
                "4" => CommentMode::BottomStatic,
                "5" => CommentMode::TopStatic,
                _ => CommentMode::Scroll,
            };
            // 先替换转义序列 \r，再替换真正的回车符
            let text = json_to_string(item.get("m")?)?
                .replace("\\r", "\n")
                .replace('\r', "\n");
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
            let payload = positioned_payload(item.get("m")?.as_str()?)?;
            Some(Comment {
                timestamp,
                sequence,
                text: payload.text.clone(),
                mode: CommentMode::Positioned(PositionedPayload::KeyframeSequence(payload)),
                color,
                user_size,
                rendered_size,
                block_height: 0.0,
                pixel_width: 0.0,
            })
        }
        _ => None,
    }
}

/// 解析 mode 7 弹幕的载荷。
fn positioned_payload(raw: &str) -> Option<AcfunPositionedPayload> {
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(raw) else {
        return None;
    };

    let text = json_to_string(map.get("n")?)?.replace('\r', "\n");
    let anchor = map.get("c").map_or(7, anchor_alignment);
    let (fontface, bold) = match map.get("w") {
        Some(font) if json_truthy(font) => {
            let font = font.as_object()?;
            let fontface = match font.get("f") {
                Some(face) if json_truthy(face) => Some(json_to_string(face)?),
                _ => None,
            };
            (fontface, font.get("b").is_some_and(json_truthy))
        }
        _ => (None, false),
    };
    let border = map.get("b").map_or(true, json_truthy);
    let (x, y) = match map.get("p") {
        Some(position) => {
            let position = position.as_object()?;
            (
                position.get("x").map_or(Some(0), json_to_i64)?,
                position.get("y").map_or(Some(0), json_to_i64)?,
            )
        }
        None => (0, 0),
    };
    let scale_x = map.get("e").map_or(Some(1.0), json_to_f64)?;
    let scale_y = map.get("f").map_or(Some(1.0), json_to_f64)?;
    let rotate_z = map.get("r").map_or(Some(0.0), json_to_f64)?;
    let rotate_y = map.get("k").map_or(Some(0.0), json_to_f64)?;
    let alpha = map.get("a").map_or(Some(1.0), json_to_f64)?;
    let delay = map.get("t").map_or(Some(0.0), json_to_f64)?;
    let hold = map.get("l").map_or(Some(3.0), json_to_f64)?;
    let actions = match map.get("z") {
        Some(value) => parse_actions(value.as_array()?)?,
        None => Vec::new(),
    };

    Some(AcfunPositionedPayload {
        text,
        anchor,
        fontface,
        bold,
        border,
        x,
        y,
        scale_x,
        scale_y,
        rotate_z,
        rotate_y,
        alpha,
        delay,
        hold,
        actions,
    })
}

/// 解析动作列表。任何一项损坏都会使整条弹幕作废。
fn parse_actions(items: &[Value]) -> Option<Vec<AcfunAction>> {
    let mut actions = Vec::with_capacity(items.len());
    for item in items {
        let map = item.as_object()?;
        let mut action = AcfunAction {
            duration: map.get("l").map_or(Some(0.0), json_to_f64)?,
            ..AcfunAction::default()
        };
        if let Some(value) = map.get("x") {
            action.x = Some(json_to_i64(value)?);
        }
        if let Some(value) = map.get("y") {
            action.y = Some(json_to_i64(value)?);
        }
        if let Some(value) = map.get("f") {
            action.scale_x = Some(json_to_f64(value)?);
        }
        if let Some(value) = map.get("g") {
            action.scale_y = Some(json_to_f64(value)?);
        }
        if let Some(value) = map.get("c") {
            action.color = Some(json_to_i64(value)? as u32);
        }
        if let Some(value) = map.get("t") {
            action.alpha = Some(json_to_f64(value)?);
        }
        if let Some(value) = map.get("d") {
            action.rotate_z = Some(json_to_f64(value)?);
        }
        if let Some(value) = map.get("e") {
            action.rotate_y = Some(json_to_f64(value)?);
        }
        actions.push(action);
    }
    Some(actions)
}

/// AcFun 的九宫格锚点编号到 ASS `\an` 对齐值的映射。
///
/// 编号按从左上到右下的阅读顺序排列，非整数或越界值回落到左上角。
fn anchor_alignment(value: &Value) -> u8 {
    const MAP: [u8; 9] = [7, 8, 9, 4, 5, 6, 1, 2, 3];
    let code = match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|float| float.fract() == 0.0)
                .map(|float| float as i64)
        }),
        Value::Bool(flag) => Some(i64::from(*flag)),
        _ => None,
    };
    code.and_then(|code| usize::try_from(code).ok())
        .and_then(|index| MAP.get(index).copied())
        .unwrap_or(7)
}
