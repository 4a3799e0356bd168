//! 转换器输出的查询构建器配置

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// 查询构建器选择的字段及作用于它的函数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub field: String,
    /// 直接选择字段时为空
    pub funcs: Vec<String>,
}

/// 查询构建器的 `GROUP BY` 设置
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GroupBy {
    /// 规范的时间间隔文本, 例如 `5m`; 没有按时间分组时为空
    pub time: String,
    pub tags: Vec<String>,
}

/// 查询构建器界面使用的扁平配置
///
/// raw 配置只有 `raw_text`, 结构化配置没有 `raw_text`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
    pub database: String,
    pub retention_policy: String,
    pub measurement: String,
    pub fields: Vec<Field>,
    pub group_by: GroupBy,
    /// tag 名到过滤值的映射, 保持出现顺序
    pub tags: IndexMap<String, Vec<String>>,
    pub are_tags_accepted: bool,
}

impl QueryConfig {
    /// 只保留原始文本的配置
    pub fn raw(text: impl Into<String>) -> Self {
        Self {
            raw_text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn is_raw(&self) -> bool {
        self.raw_text.is_some()
    }
}

/// 转换成功的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conversion {
    /// 语句能由查询构建器展示
    Structured(QueryConfig),
    /// 语句超出查询构建器的表达能力, 保留原始文本
    Raw(String),
}

impl Conversion {
    pub fn is_structured(&self) -> bool {
        matches!(self, Conversion::Structured(_))
    }

    pub fn as_structured(&self) -> Option<&QueryConfig> {
        match self {
            Conversion::Structured(config) => Some(config),
            Conversion::Raw(_) => None,
        }
    }

    /// 转换为界面使用的统一结构
    pub fn into_config(self) -> QueryConfig {
        match self {
            Conversion::Structured(config) => config,
            Conversion::Raw(text) => QueryConfig::raw(text),
        }
    }
}
