//! 高级定位弹幕的渲染。
//!
//! 定位数据在解析阶段已规范化为关键帧载荷，这里只负责把关键帧翻译成
//! `\pos`、`\move`、`\t` 等覆盖标签并写出事件行。定位弹幕不参与行分配，
//! 事件层固定为 -1。

use std::fmt::Write as _;

use crate::config::AssRenderOptions;
use crate::error::ConvertError;
use crate::types::{AcfunPositionedPayload, BiliCoordinate, BiliPositionedPayload, Comment};

use super::geometry::{
    ACFUN_PLAYER_SIZE, BILI_PLAYER_SIZE, FlashRotation, ZoomFactor, ZoomFactorCache,
    convert_flash_rotation,
};
use super::utils::{convert_color, escape_ass_text, format_timestamp};

/// 透明度标签使用的字节值，0 为不透明。
fn alpha_override(alpha: f64) -> i64 {
    255 - (alpha * 255.0).round() as i64
}

fn rotation_tags(rotation: &FlashRotation, scale_x: f64, scale_y: f64) -> String {
    format!(
        "\\frx{:.0}\\fry{:.0}\\frz{:.0}\\fscx{:.0}\\fscy{:.0}",
        rotation.rot_x,
        rotation.rot_y,
        rotation.rot_z,
        rotation.scale_x * scale_x,
        rotation.scale_y * scale_y,
    )
}

/// 旧版播放器坐标到目标画布坐标的换算。
fn bili_position(coordinate: BiliCoordinate, zoom: ZoomFactor, is_height: bool) -> f64 {
    let (player_dim, offset) = if is_height {
        (f64::from(BILI_PLAYER_SIZE.1), zoom.offset_y)
    } else {
        (f64::from(BILI_PLAYER_SIZE.0), zoom.offset_x)
    };
    match coordinate {
        BiliCoordinate::Absolute(value) => zoom.scale * value + offset,
        BiliCoordinate::Proportional(ratio) => player_dim * zoom.scale * ratio + offset,
    }
}

/// 写出一条 Bilibili mode 7 弹幕的事件行。
///
/// 单段 from → to 动画恰好展开成一个事件：位置用 `\pos` 或六参数
/// `\move`，旋转经 [`convert_flash_rotation`] 投影，透明度按两端是否
/// 相等选择 `\alpha`、`\fad` 或 `\fade`。
pub(super) fn write_bilibili_positioned(
    output: &mut String,
    comment: &Comment,
    payload: &BiliPositionedPayload,
    options: &AssRenderOptions,
    styleid: &str,
    zoom_cache: &mut ZoomFactorCache,
) -> Result<(), ConvertError> {
    let width = f64::from(options.width);
    let height = f64::from(options.height);
    let zoom = zoom_cache.get(BILI_PLAYER_SIZE, (options.width, options.height));

    let from_x = bili_position(payload.from_x, zoom, false);
    let from_y = bili_position(payload.from_y, zoom, true);
    let to_x = bili_position(payload.to_x, zoom, false);
    let to_y = bili_position(payload.to_y, zoom, true);
    let from_alpha = alpha_override(payload.from_alpha);
    let to_alpha = alpha_override(payload.to_alpha);

    let from_rotation = convert_flash_rotation(
        payload.rotate_y,
        payload.rotate_z,
        from_x,
        from_y,
        width,
        height,
    );
    let to_rotation =
        convert_flash_rotation(payload.rotate_y, payload.rotate_z, to_x, to_y, width, height);

    let mut styles = format!("\\org({}, {})", options.width / 2, options.height / 2);
    let delay_end = payload.delay + payload.duration;
    if (from_rotation.x, from_rotation.y) == (to_rotation.x, to_rotation.y) {
        write!(styles, "\\pos({:.0}, {:.0})", from_rotation.x, from_rotation.y)?;
    } else {
        write!(
            styles,
            "\\move({:.0}, {:.0}, {:.0}, {:.0}, {:.0}, {:.0})",
            from_rotation.x,
            from_rotation.y,
            to_rotation.x,
            to_rotation.y,
            payload.delay as f64,
            delay_end as f64,
        )?;
    }
    styles.push_str(&rotation_tags(&from_rotation, 1.0, 1.0));
    if (from_x, from_y) != (to_x, to_y) {
        write!(styles, "\\t({}, {}, ", payload.delay, delay_end)?;
        styles.push_str(&rotation_tags(&to_rotation, 1.0, 1.0));
        styles.push(')');
    }
    if let Some(face) = &payload.fontface {
        write!(styles, "\\fn{}", escape_ass_text(face))?;
    }
    write!(styles, "\\fs{:.0}", comment.rendered_size * zoom.scale)?;
    if comment.color != 0xFF_FFFF {
        write!(styles, "\\c&H{}&", convert_color(comment.color))?;
        if comment.color == 0x00_0000 {
            styles.push_str("\\3c&HFFFFFF&");
        }
    }
    let fade_end = payload.lifetime * 1000.0;
    if from_alpha == to_alpha {
        write!(styles, "\\alpha&H{from_alpha:02X}")?;
    } else if (from_alpha, to_alpha) == (255, 0) {
        write!(styles, "\\fad({fade_end:.0},0)")?;
    } else if (from_alpha, to_alpha) == (0, 255) {
        write!(styles, "\\fad(0, {fade_end:.0})")?;
    } else {
        write!(
            styles,
            "\\fade({from_alpha}, {to_alpha}, {to_alpha}, 0, {fade_end:.0}, {fade_end:.0}, {fade_end:.0})"
        )?;
    }
    if !payload.border {
        styles.push_str("\\bord0");
    }
    writeln!(
        output,
        "Dialogue: -1,{},{},{},,0,0,0,,{{{}}}{}",
        format_timestamp(comment.timestamp),
        format_timestamp(comment.timestamp + payload.lifetime),
        styleid,
        styles,
        escape_ass_text(&payload.text),
    )?;
    Ok(())
}

/// 一个关键帧求值后的完整状态。
#[derive(Debug, Clone, Copy)]
struct KeyframeState {
    x: f64,
    y: f64,
    scale_x: f64,
    scale_y: f64,
    rotate_z: f64,
    rotate_y: f64,
    color: u32,
    alpha: f64,
}

/// 求一个关键帧的投影位置和覆盖标签。
fn acfun_transform(
    frame: &KeyframeState,
    width: f64,
    height: f64,
) -> Result<(f64, f64, String), ConvertError> {
    let rotation =
        convert_flash_rotation(frame.rotate_y, frame.rotate_z, frame.x, frame.y, width, height);
    let mut styles = rotation_tags(&rotation, frame.scale_x, frame.scale_y);
    write!(styles, "\\c&H{}&", convert_color(frame.color))?;
    if frame.color == 0x00_0000 {
        styles.push_str("\\3c&HFFFFFF&");
    }
    write!(styles, "\\alpha&H{:02X}", alpha_override(frame.alpha))?;
    Ok((rotation.x, rotation.y, styles))
}

fn flush_event(
    output: &mut String,
    styles: &str,
    text: &str,
    start: f64,
    end: f64,
    styleid: &str,
) -> Result<(), ConvertError> {
    if end > start {
        writeln!(
            output,
            "Dialogue: -1,{},{},{styleid},,0,0,0,,{{{styles}}}{text}",
            format_timestamp(start),
            format_timestamp(end),
        )?;
    }
    Ok(())
}

/// 写出一条 AcFun 高级弹幕的事件行序列。
///
/// 初始关键帧停留 `hold` 秒，之后每个动作段展开成一个事件。
/// 缩放、颜色和透明度的变化滞后一段生效，位置和旋转立即生效，
/// 与旧版播放器的实际表现一致。时长为零的段不写出，但状态照常推进。
pub(super) fn write_acfun_positioned(
    output: &mut String,
    comment: &Comment,
    payload: &AcfunPositionedPayload,
    options: &AssRenderOptions,
    styleid: &str,
    zoom_cache: &mut ZoomFactorCache,
) -> Result<(), ConvertError> {
    let width = f64::from(options.width);
    let height = f64::from(options.height);
    let zoom = zoom_cache.get(ACFUN_PLAYER_SIZE, (options.width, options.height));
    let acfun_position = |permille: i64, is_height: bool| -> f64 {
        let (player_dim, offset) = if is_height {
            (f64::from(ACFUN_PLAYER_SIZE.1), zoom.offset_y)
        } else {
            (f64::from(ACFUN_PLAYER_SIZE.0), zoom.offset_x)
        };
        player_dim * zoom.scale * permille as f64 * 0.001 + offset
    };

    let text = escape_ass_text(&payload.text);
    let mut common = format!("\\org({}, {})", options.width / 2, options.height / 2);
    if payload.anchor != 7 {
        write!(common, "\\an{}", payload.anchor)?;
    }
    if let Some(face) = &payload.fontface {
        write!(common, "\\fn{}", escape_ass_text(face))?;
    }
    if payload.bold {
        common.push_str("\\b1");
    }
    write!(common, "\\fs{:.0}", comment.rendered_size * zoom.scale)?;
    if !payload.border {
        common.push_str("\\bord0");
    }

    let mut to = KeyframeState {
        x: acfun_position(payload.x, false).round(),
        y: acfun_position(payload.y, true).round(),
        scale_x: payload.scale_x,
        scale_y: payload.scale_y,
        rotate_z: payload.rotate_z,
        rotate_y: payload.rotate_y,
        color: comment.color,
        alpha: payload.alpha,
    };
    let mut from_time = payload.delay;
    let mut action_time = payload.hold;

    let (mut to_out_x, mut to_out_y, transform) = acfun_transform(&to, width, height)?;
    flush_event(
        output,
        &format!("{common}\\pos({to_out_x:.0}, {to_out_y:.0}){transform}"),
        &text,
        comment.timestamp + from_time,
        comment.timestamp + from_time + action_time,
        styleid,
    )?;

    let mut action_styles = transform;
    for action in &payload.actions {
        let from = to;
        let from_out_x = to_out_x;
        let from_out_y = to_out_y;
        let transform_styles = std::mem::take(&mut action_styles);
        from_time += action_time;
        action_time = action.duration;
        if let Some(x) = action.x {
            to.x = acfun_position(x, false).round();
        }
        if let Some(y) = action.y {
            to.y = acfun_position(y, true).round();
        }
        if let Some(scale) = action.scale_x {
            to.scale_x = scale;
        }
        if let Some(scale) = action.scale_y {
            to.scale_y = scale;
        }
        if let Some(color) = action.color {
            to.color = color;
        }
        if let Some(alpha) = action.alpha {
            to.alpha = alpha;
        }
        if let Some(rotate) = action.rotate_z {
            to.rotate_z = rotate;
        }
        if let Some(rotate) = action.rotate_y {
            to.rotate_y = rotate;
        }
        // 缩放、颜色、透明度取上一帧的值，滞后一段生效
        let staged = KeyframeState {
            scale_x: from.scale_x,
            scale_y: from.scale_y,
            color: from.color,
            alpha: from.alpha,
            ..to
        };
        let (out_x, out_y, next_styles) = acfun_transform(&staged, width, height)?;
        to_out_x = out_x;
        to_out_y = out_y;
        action_styles = next_styles;
        let position_style = if (from_out_x, from_out_y) == (to_out_x, to_out_y) {
            format!("\\pos({to_out_x:.0}, {to_out_y:.0})")
        } else {
            format!("\\move({from_out_x:.0}, {from_out_y:.0}, {to_out_x:.0}, {to_out_y:.0})")
        };
        let mut styles = format!("{common}{transform_styles}{position_style}");
        if !action_styles.is_empty() {
            write!(styles, "\\t({action_styles})")?;
        }
        flush_event(
            output,
            &styles,
            &text,
            comment.timestamp + from_time,
            comment.timestamp + from_time + action_time,
            styleid,
        )?;
    }
    Ok(())
}
