//! # Danmaku Processor: A Converter from Comment Feeds to ASS Subtitles
//!
//! This crate provides tools for turning timestamped overlay comments ("danmaku")
//! into Advanced SubStation Alpha (ASS) subtitle documents. It ships streaming
//! parsers for the two common feed formats and a deterministic renderer that
//! lays comments out on screen without overlap.
//!
//! The primary functions you will use are:
//! - [`parse_bilibili`]: Converts a Bilibili XML feed into a sorted list of [`Comment`]s.
//! - [`parse_acfun`]: Does the same for an AcFun JSON feed.
//! - [`generate_ass`]: Renders a comment list into a complete ASS document.
//!
//! ## ⚠️ Important: Not a General-Purpose ASS Library
//!
//! The generated documents follow the danmaku overlay convention: every event
//! is absolutely positioned with `\pos` or `\move` override tags and collisions
//! are resolved ahead of time by the renderer itself. The output is not meant
//! to be re-parsed as dialogue subtitles, and the parsers only understand the
//! comment feed formats described above.
//!
//! ## Examples
//!
//! A minimal conversion from a Bilibili XML feed to an ASS document:
//!
//! ```rust
//! use danmaku_processor::{generate_ass, parse_bilibili, AssRenderOptionsBuilder};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
//!     <i>
//!         <d p="3.5,1,25,16777215,1422201084,0,7a3f,1">一条滚动弹幕</d>
//!         <d p="10.0,5,36,16711680,1422201085,0,7a3f,2">顶部红色弹幕</d>
//!     </i>"#;
//!
//!     let comments = parse_bilibili(xml, 25.0)?;
//!     assert_eq!(comments.len(), 2);
//!     assert_eq!(comments[0].text, "一条滚动弹幕");
//!
//!     let options = AssRenderOptionsBuilder::default()
//!         .width(1280_u32)
//!         .height(720_u32)
//!         .build()?;
//!     let document = generate_ass(&comments, &options)?;
//!
//!     assert!(document.contains("[Script Info]"));
//!     assert!(document.contains("PlayResX: 1280"));
//!     assert!(document.contains("Dialogue:"));
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod generator;
pub mod parser;
pub mod types;

pub use config::{AssRenderOptions, AssRenderOptionsBuilder};
pub use error::ConvertError;
pub use generator::{generate_ass, generate_ass_with_progress};
pub use parser::{parse_acfun, parse_bilibili};
pub use types::{
    AcfunAction, AcfunPositionedPayload, BiliCoordinate, BiliPositionedPayload, Comment,
    CommentMode, PositionedPayload,
};
