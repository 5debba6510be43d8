//! 定义弹幕解析和字幕生成过程中可能发生的各种错误。

use std::{fmt, io};

use quick_xml::{
    Error as QuickXmlErrorMain, encoding::EncodingError,
    events::attributes::AttrError as QuickXmlAttrError,
};
use thiserror::Error;

/// 定义弹幕转换过程中可能发生的各种错误。
#[derive(Error, Debug)]
pub enum ConvertError {
    /// XML 解析错误，通常来自 `quick-xml` 库。
    #[error("解析 XML 错误: {0}")]
    Xml(#[from] QuickXmlErrorMain),
    /// XML 属性解析错误，通常来自 `quick-xml` 库。
    #[error("XML 属性错误: {0}")]
    Attribute(#[from] QuickXmlAttrError),
    /// XML 文本编码或解码错误。
    #[error("文本编码或解码错误: {0}")]
    Encoding(#[from] EncodingError),
    /// 未明确分类的底层解析错误。
    #[error("解析错误: {0}")]
    Parse(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// 字符串格式化错误。
    #[error("格式错误: {0}")]
    Format(#[from] fmt::Error),
    /// JSON 解析错误。
    #[error("解析 JSON 内容 {context} 失败: {source}")]
    JsonParse {
        /// 底层 `serde_json` 错误。
        #[source]
        source: serde_json::Error,
        /// 有关错误发生位置的上下文信息。
        context: String,
    },
    /// JSON 结构不符合预期。
    #[error("JSON 结构无效: {0}")]
    InvalidJsonStructure(String),
    /// 屏蔽规则的正则表达式编译失败。
    #[error("无效的屏蔽规则 '{pattern}': {source}")]
    InvalidFilter {
        /// 底层 `regex` 错误。
        #[source]
        source: regex::Error,
        /// 编译失败的原始规则。
        pattern: String,
    },
    /// 内部逻辑错误或未明确分类的错误。
    #[error("错误: {0}")]
    Internal(String),
}

impl From<ConvertError> for io::Error {
    fn from(err: ConvertError) -> Self {
        io::Error::other(err)
    }
}

impl ConvertError {
    /// 创建一个带有上下文的 `JsonParse` 错误。
    #[must_use]
    pub fn json_parse(source: serde_json::Error, context: String) -> Self {
        Self::JsonParse { source, context }
    }

    /// 包装一个未明确分类的底层解析错误。
    #[must_use]
    pub fn new_parse<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Parse(Box::new(source))
    }
}
