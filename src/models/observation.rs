use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::FieldErrors;

/// 取值约束
#[derive(Debug, Clone, Copy)]
enum Bound {
    /// 严格大于 0
    Positive,
    /// 大于等于 0
    NonNegative,
    /// 闭区间
    Between(f64, f64),
}

/// 单个数值字段的校验规则
#[derive(Debug, Clone, Copy)]
struct FieldRule {
    name: &'static str,
    label: &'static str,
    bound: Bound,
}

impl FieldRule {
    const fn new(name: &'static str, label: &'static str, bound: Bound) -> Self {
        Self { name, label, bound }
    }

    fn check(&self, value: Option<f64>, errors: &mut FieldErrors) -> Option<f64> {
        let Some(value) = value.filter(|v| v.is_finite()) else {
            errors.insert(self.name.into(), format!("{} must be a number.", self.label));
            return None;
        };

        let message = match self.bound {
            Bound::Positive if value <= 0.0 => format!("{} must be > 0.", self.label),
            Bound::NonNegative if value < 0.0 => format!("{} must be >= 0.", self.label),
            Bound::Between(lo, hi) if !(lo..=hi).contains(&value) => {
                format!("{} must be between {} and {}.", self.label, lo, hi)
            }
            _ => return Some(value),
        };
        errors.insert(self.name.into(), message);
        None
    }
}

const AVG_GLUCOSE: FieldRule = FieldRule::new("avg_glucose", "Average glucose", Bound::Positive);
const GLUCOSE_SD: FieldRule = FieldRule::new("glucose_sd", "Glucose SD", Bound::NonNegative);
const DIFFICULTY: FieldRule = FieldRule::new("difficulty", "Difficulty", Bound::Between(1.0, 10.0));
const SCORE: FieldRule = FieldRule::new("score", "Score", Bound::Between(0.0, 100.0));

/// 从 JSON 字段读取数值，接受数字或数字字符串
fn read_number(fields: &Map<String, Value>, name: &str) -> Option<f64> {
    match fields.get(name)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// 历史记录
///
/// 一条已持久化的（特征, 成绩）观测。写入后不可变。
/// 数值字段在存储边界上是可选的：从无模式存储读回的行可能缺少字段，
/// 预测器会拒绝这样的记录。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Observation {
    /// 自增标识，从 1 开始
    pub id: u64,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 平均血糖（mg/dL）
    #[serde(default)]
    pub avg_glucose: Option<f64>,
    /// 血糖标准差
    #[serde(default)]
    pub glucose_sd: Option<f64>,
    /// 难度（1-10）
    #[serde(default)]
    pub difficulty: Option<f64>,
    /// 考试成绩（0-100）
    #[serde(default)]
    pub score: Option<f64>,
}

impl Observation {
    /// 由已校验的提交内容生成记录
    pub fn new(id: u64, created_at: DateTime<Utc>, entry: NewObservation) -> Self {
        Self {
            id,
            created_at,
            avg_glucose: Some(entry.avg_glucose),
            glucose_sd: Some(entry.glucose_sd),
            difficulty: Some(entry.difficulty),
            score: Some(entry.score),
        }
    }
}

/// 待写入的观测
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NewObservation {
    pub avg_glucose: f64,
    pub glucose_sd: f64,
    pub difficulty: f64,
    pub score: f64,
}

impl NewObservation {
    pub fn new(avg_glucose: f64, glucose_sd: f64, difficulty: f64, score: f64) -> Self {
        Self {
            avg_glucose,
            glucose_sd,
            difficulty,
            score,
        }
    }

    /// 从请求体字段解析并校验
    pub fn parse(fields: &Map<String, Value>) -> Result<Self, FieldErrors> {
        Self::check(
            read_number(fields, AVG_GLUCOSE.name),
            read_number(fields, GLUCOSE_SD.name),
            read_number(fields, DIFFICULTY.name),
            read_number(fields, SCORE.name),
        )
    }

    /// 校验取值范围
    pub fn validate(&self) -> Result<(), FieldErrors> {
        Self::check(
            Some(self.avg_glucose),
            Some(self.glucose_sd),
            Some(self.difficulty),
            Some(self.score),
        )
        .map(|_| ())
    }

    fn check(
        avg_glucose: Option<f64>,
        glucose_sd: Option<f64>,
        difficulty: Option<f64>,
        score: Option<f64>,
    ) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();
        let avg_glucose = AVG_GLUCOSE.check(avg_glucose, &mut errors);
        let glucose_sd = GLUCOSE_SD.check(glucose_sd, &mut errors);
        let difficulty = DIFFICULTY.check(difficulty, &mut errors);
        let score = SCORE.check(score, &mut errors);

        match (avg_glucose, glucose_sd, difficulty, score) {
            (Some(avg_glucose), Some(glucose_sd), Some(difficulty), Some(score))
                if errors.is_empty() =>
            {
                Ok(Self::new(avg_glucose, glucose_sd, difficulty, score))
            }
            _ => Err(errors),
        }
    }
}

/// 预测查询：只有特征，没有成绩
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FeatureQuery {
    pub avg_glucose: f64,
    pub glucose_sd: f64,
    pub difficulty: f64,
}

impl FeatureQuery {
    pub fn new(avg_glucose: f64, glucose_sd: f64, difficulty: f64) -> Self {
        Self {
            avg_glucose,
            glucose_sd,
            difficulty,
        }
    }

    /// 从请求体字段解析并校验
    pub fn parse(fields: &Map<String, Value>) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();
        let avg_glucose = AVG_GLUCOSE.check(read_number(fields, AVG_GLUCOSE.name), &mut errors);
        let glucose_sd = GLUCOSE_SD.check(read_number(fields, GLUCOSE_SD.name), &mut errors);
        let difficulty = DIFFICULTY.check(read_number(fields, DIFFICULTY.name), &mut errors);

        match (avg_glucose, glucose_sd, difficulty) {
            (Some(avg_glucose), Some(glucose_sd), Some(difficulty)) if errors.is_empty() => {
                Ok(Self::new(avg_glucose, glucose_sd, difficulty))
            }
            _ => Err(errors),
        }
    }
}
