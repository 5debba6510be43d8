//! ASS 字幕生成器。
//!
//! 输入为按 (时间戳, 序号) 排好序的弹幕列表，单次前向扫描完成行分配并
//! 写出完整的 ASS 文档。事件按处理顺序写出，不再重排。

mod geometry;
mod lanes;
mod positioned;
mod utils;

use std::fmt::Write as _;

use rand::Rng as _;
use regex::Regex;

use crate::config::AssRenderOptions;
use crate::error::ConvertError;
use crate::types::{Comment, CommentMode, PositionedPayload};

use self::geometry::ZoomFactorCache;
use self::lanes::LaneGrid;

/// 把排好序的弹幕渲染成完整的 ASS 文档。
///
/// 输入应当已按 (时间戳, 序号) 升序排列，[`crate::parser`] 的输出
/// 满足这一要求。屏蔽规则编译失败时返回
/// [`ConvertError::InvalidFilter`]，渲染过程本身不会失败。
///
/// # Errors
///
/// 屏蔽规则不是合法的正则表达式时返回错误。
pub fn generate_ass(
    comments: &[Comment],
    options: &AssRenderOptions,
) -> Result<String, ConvertError> {
    generate_ass_with_progress(comments, options, |_, _| {})
}

/// 同 [`generate_ass`]，但带进度回调。
///
/// 回调参数为（已处理条数，总条数），每 1000 条触发一次，
/// 全部处理完后再以（总条数，总条数）触发一次。
///
/// # Errors
///
/// 屏蔽规则不是合法的正则表达式时返回错误。
pub fn generate_ass_with_progress(
    comments: &[Comment],
    options: &AssRenderOptions,
    mut progress: impl FnMut(usize, usize),
) -> Result<String, ConvertError> {
    let filters = compile_filters(&options.filters)?;
    let styleid = options
        .style_name
        .clone()
        .unwrap_or_else(random_style_name);

    let mut output = String::from('\u{FEFF}');
    write_ass_header(&mut output, options, &styleid)?;

    let mut grid = LaneGrid::new(options);
    let mut zoom_cache = ZoomFactorCache::new();
    for (index, comment) in comments.iter().enumerate() {
        if index % 1000 == 0 {
            progress(index, comments.len());
        }
        match &comment.mode {
            CommentMode::Positioned(PositionedPayload::SingleKeyframe(payload)) => {
                positioned::write_bilibili_positioned(
                    &mut output,
                    comment,
                    payload,
                    options,
                    &styleid,
                    &mut zoom_cache,
                )?;
            }
            CommentMode::Positioned(PositionedPayload::KeyframeSequence(payload)) => {
                positioned::write_acfun_positioned(
                    &mut output,
                    comment,
                    payload,
                    options,
                    &styleid,
                    &mut zoom_cache,
                )?;
            }
            _ => {
                if filters.iter().any(|filter| filter.is_match(&comment.text)) {
                    continue;
                }
                if let Some(row) = grid.allocate(comment, options.reduce_comments) {
                    write_lane_comment(&mut output, comment, row, options, &styleid)?;
                }
            }
        }
    }
    progress(comments.len(), comments.len());
    Ok(output)
}

fn random_style_name() -> String {
    format!("Danmaku_{:04x}", rand::rng().random::<u16>())
}

/// 编译屏蔽规则。空字符串不构成规则，直接跳过。
fn compile_filters(patterns: &[String]) -> Result<Vec<Regex>, ConvertError> {
    patterns
        .iter()
        .filter(|pattern| !pattern.is_empty())
        .map(|pattern| {
            Regex::new(pattern).map_err(|source| ConvertError::InvalidFilter {
                source,
                pattern: pattern.clone(),
            })
        })
        .collect()
}

fn write_ass_header(
    output: &mut String,
    options: &AssRenderOptions,
    styleid: &str,
) -> Result<(), ConvertError> {
    let alpha = utils::alpha_byte(options.text_opacity);
    let outline = (options.font_size / 25.0).max(1.0);
    write!(
        output,
        "[Script Info]\n\
         ; Script generated by danmaku_processor\n\
         Script Updated By: danmaku_processor\n\
         ScriptType: v4.00+\n\
         PlayResX: {width}\n\
         PlayResY: {height}\n\
         Aspect Ratio: {width}:{height}\n\
         Collisions: Normal\n\
         WrapStyle: 2\n\
         ScaledBorderAndShadow: yes\n\
         YCbCr Matrix: TV.601\n\
         \n\
         [V4+ Styles]\n\
         Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding\n\
         Style: {styleid}, {font_face}, {font_size:.0}, &H{alpha:02X}FFFFFF, &H{alpha:02X}FFFFFF, &H{alpha:02X}000000, &H{alpha:02X}000000, 0, 0, 0, 0, 100, 100, 0.00, 0.00, 1, {outline:.0}, 0, 7, 0, 0, 0, 0\n\
         \n\
         [Events]\n\
         Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n",
        width = options.width,
        height = options.height,
        font_face = options.font_face,
        font_size = options.font_size,
    )?;
    Ok(())
}

/// 写出一条参与行分配的弹幕。
///
/// 滚动弹幕的显示时长固定为 `duration_marquee`，与文本长度无关，
/// 长文本因此滚得更快。
fn write_lane_comment(
    output: &mut String,
    comment: &Comment,
    row: usize,
    options: &AssRenderOptions,
    styleid: &str,
) -> Result<(), ConvertError> {
    let half_width = options.width / 2;
    let negative_length = -(comment.pixel_width.ceil() as i64);
    let (mut styles, duration) = match comment.mode {
        CommentMode::TopStatic => (
            format!("\\an8\\pos({half_width}, {row})"),
            options.duration_still,
        ),
        CommentMode::BottomStatic => {
            let from_bottom =
                i64::from(options.height) - i64::from(options.bottom_reserved) - row as i64;
            (
                format!("\\an2\\pos({half_width}, {from_bottom})"),
                options.duration_still,
            )
        }
        CommentMode::ScrollReverse => (
            format!(
                "\\move({negative_length}, {row}, {}, {row})",
                options.width
            ),
            options.duration_marquee,
        ),
        _ => (
            format!(
                "\\move({}, {row}, {negative_length}, {row})",
                options.width
            ),
            options.duration_marquee,
        ),
    };
    if (comment.rendered_size - options.font_size).abs() >= 1.0 {
        write!(styles, "\\fs{:.0}", comment.rendered_size)?;
    }
    if comment.color != 0xFF_FFFF {
        write!(styles, "\\c&H{}&", utils::convert_color(comment.color))?;
        if comment.color == 0x00_0000 {
            styles.push_str("\\3c&HFFFFFF&");
        }
    }
    writeln!(
        output,
        "Dialogue: 2,{},{},{styleid},,0000,0000,0000,,{{{styles}}}{}",
        utils::format_timestamp(comment.timestamp),
        utils::format_timestamp(comment.timestamp + duration),
        utils::escape_ass_text(&comment.text),
    )?;
    Ok(())
}
