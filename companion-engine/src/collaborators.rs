//! External collaborator seams: persistence, history, service catalog, and
//! recommendations. The engine only sees these traits; in-process
//! implementations live here so the subsystem runs (and tests) end to end
//! without any real backend.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::report::Period;

/// A service that can be booked through the dialogue flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookableService {
    pub id: i64,
    pub name: String,
    pub category: String,
    /// Hourly price in won.
    pub price: i64,
}

/// A recommended welfare program, remembered for detail follow-ups.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSummary {
    pub name: String,
    pub summary: String,
    pub organization: String,
}

/// A finalized expense ready for persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpense {
    pub merchant_name: String,
    pub amount: i64,
    pub category: String,
    pub transaction_date: NaiveDate,
    pub memo: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseItem {
    pub merchant_name: String,
    pub amount: i64,
    pub category: String,
    pub transaction_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category: String,
    pub total_amount: i64,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseReport {
    pub items: Vec<ExpenseItem>,
    pub totals_by_category: Vec<CategoryTotal>,
    pub total_amount: i64,
}

/// Recommendation content plus the services it mentioned.
#[derive(Debug, Clone)]
pub struct Recommendation {
    pub content: String,
    pub services: Vec<ServiceSummary>,
}

/// Persistence and history for expense records.
#[async_trait]
pub trait ExpenseLedger: Send + Sync {
    async fn create_expense(&self, user_id: i64, expense: NewExpense) -> Result<()>;
    async fn expense_history(&self, user_id: i64, period: Period) -> Result<ExpenseReport>;
}

/// Source of bookable services for the booking flow.
#[async_trait]
pub trait ServiceCatalog: Send + Sync {
    async fn list_bookable_services(&self) -> Result<Vec<BookableService>>;
}

/// Supplier of welfare recommendations and their detail elaborations.
#[async_trait]
pub trait RecommendationProvider: Send + Sync {
    async fn recommend(&self, category: Option<&str>, question: &str) -> Result<Recommendation>;
    async fn describe(&self, services: &[ServiceSummary], question: &str) -> Result<String>;
}

/// Caching decorator over a [`ServiceCatalog`]; entries live ~5 minutes.
pub struct CachedServiceCatalog {
    inner: Arc<dyn ServiceCatalog>,
    ttl: Duration,
    cache: RwLock<Option<(Instant, Vec<BookableService>)>>,
}

impl CachedServiceCatalog {
    pub fn new(inner: Arc<dyn ServiceCatalog>) -> Self {
        Self::with_ttl(inner, Duration::from_secs(300))
    }

    pub fn with_ttl(inner: Arc<dyn ServiceCatalog>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cache: RwLock::new(None),
        }
    }
}

#[async_trait]
impl ServiceCatalog for CachedServiceCatalog {
    async fn list_bookable_services(&self) -> Result<Vec<BookableService>> {
        if let Some((stamp, services)) = self.cache.read().await.as_ref() {
            if stamp.elapsed() < self.ttl {
                return Ok(services.clone());
            }
        }
        let services = self.inner.list_bookable_services().await?;
        debug!(count = services.len(), "service catalog cache refreshed");
        *self.cache.write().await = Some((Instant::now(), services.clone()));
        Ok(services)
    }
}

/// Fixed catalog with the three care services the app offers.
pub struct StaticServiceCatalog;

#[async_trait]
impl ServiceCatalog for StaticServiceCatalog {
    async fn list_bookable_services(&self) -> Result<Vec<BookableService>> {
        Ok(vec![
            BookableService {
                id: 1,
                name: "일상가사 돌봄".to_string(),
                category: "가사지원".to_string(),
                price: 30_000,
            },
            BookableService {
                id: 2,
                name: "가정간병 돌봄".to_string(),
                category: "간병지원".to_string(),
                price: 40_000,
            },
            BookableService {
                id: 3,
                name: "정서지원 돌봄".to_string(),
                category: "정서지원".to_string(),
                price: 20_000,
            },
        ])
    }
}

/// In-memory implementation of [`ExpenseLedger`]
pub struct InMemoryExpenseLedger {
    records: DashMap<i64, Vec<ExpenseItem>>,
}

impl InMemoryExpenseLedger {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    pub fn count_for(&self, user_id: i64) -> usize {
        self.records.get(&user_id).map(|r| r.len()).unwrap_or(0)
    }
}

impl Default for InMemoryExpenseLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExpenseLedger for InMemoryExpenseLedger {
    async fn create_expense(&self, user_id: i64, expense: NewExpense) -> Result<()> {
        self.records.entry(user_id).or_default().push(ExpenseItem {
            merchant_name: expense.merchant_name,
            amount: expense.amount,
            category: expense.category,
            transaction_date: expense.transaction_date,
        });
        Ok(())
    }

    async fn expense_history(&self, user_id: i64, period: Period) -> Result<ExpenseReport> {
        let today = Local::now().date_naive();
        let (start, end) = period.resolve(today);

        let items: Vec<ExpenseItem> = self
            .records
            .get(&user_id)
            .map(|records| {
                records
                    .iter()
                    .filter(|item| item.transaction_date >= start && item.transaction_date <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        let mut totals: Vec<CategoryTotal> = Vec::new();
        for item in &items {
            match totals.iter_mut().find(|t| t.category == item.category) {
                Some(total) => {
                    total.total_amount += item.amount;
                    total.count += 1;
                }
                None => totals.push(CategoryTotal {
                    category: item.category.clone(),
                    total_amount: item.amount,
                    count: 1,
                }),
            }
        }
        totals.sort_by(|a, b| b.total_amount.cmp(&a.total_amount));

        let total_amount = items.iter().map(|item| item.amount).sum();
        Ok(ExpenseReport {
            items,
            totals_by_category: totals,
            total_amount,
        })
    }
}

/// Template-backed [`RecommendationProvider`] used when no generative
/// collaborator is wired in. Suggests one of a fixed activity pool.
pub struct FallbackRecommendationProvider;

const DEFAULT_ACTIVITIES: &[(&str, &str, &str)] = &[
    (
        "건강한 산책",
        "날씨가 좋으니 근처 공원에서 가벼운 산책은 어떠세요? 신선한 공기를 마시며 건강도 챙기실 수 있어요.",
        "지역보건소",
    ),
    (
        "독서 시간",
        "좋아하는 책을 읽으며 여유로운 시간을 보내보세요. 도서관에서 새로운 책을 빌려보시는 것도 좋겠어요.",
        "지역도서관",
    ),
    (
        "가벼운 체조",
        "집에서 할 수 있는 간단한 스트레칭으로 몸을 풀어보세요. TV 체조 프로그램을 따라해보시는 것도 좋아요.",
        "지역복지관",
    ),
    (
        "가족과의 시간",
        "가족들과 안부 전화를 나누며 따뜻한 시간을 보내세요. 손자손녀들 목소리를 들으면 기분이 좋아지실 거예요.",
        "지역복지관",
    ),
];

#[async_trait]
impl RecommendationProvider for FallbackRecommendationProvider {
    async fn recommend(&self, category: Option<&str>, _question: &str) -> Result<Recommendation> {
        let index = rand::random_range(0..DEFAULT_ACTIVITIES.len());
        let (name, summary, organization) = DEFAULT_ACTIVITIES[index];
        let lead = match category {
            Some(category) => format!("{category} 분야를 찾으셨군요! 오늘은 {name}는 어떠세요?"),
            None => format!("오늘은 {name}는 어떠세요?"),
        };
        Ok(Recommendation {
            content: format!(
                "{lead}\n\n{summary}\n\n복지서비스 페이지에서 더 많은 프로그램을 확인하실 수 있어요!"
            ),
            services: vec![ServiceSummary {
                name: name.to_string(),
                summary: summary.to_string(),
                organization: organization.to_string(),
            }],
        })
    }

    async fn describe(&self, services: &[ServiceSummary], _question: &str) -> Result<String> {
        if services.is_empty() {
            return Err(EngineError::collaborator(
                "recommendation",
                "no services to describe",
            ));
        }
        let mut lines = vec!["복지서비스 상세 정보를 알려드릴게요.".to_string(), String::new()];
        for service in services {
            lines.push(format!("📋 {}", service.name));
            lines.push(format!("📝 내용: {}", service.summary));
            lines.push(format!("🏢 담당기관: {}", service.organization));
            lines.push(String::new());
        }
        lines.push("📱 더 많은 복지서비스는 복지서비스 메뉴에서 확인하세요!".to_string());
        Ok(lines.join("\n"))
    }
}
