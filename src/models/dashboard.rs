use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{Participant, Submission, SystemInfo};
use crate::utils::{mask_email, mask_phone};

/// 仪表盘行: 提交记录左连接其参与记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DashboardRow {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_info: Option<SystemInfo>,
    pub won_prize: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redeem_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redeemed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redeemed_at: Option<DateTime<Utc>>,
}

impl DashboardRow {
    fn join(id: String, submission: Submission, participant: Option<&Participant>) -> Self {
        let (won_prize, redeem_code, redeemed, redeemed_at) = match participant {
            Some(p) if p.won_prize => (true, p.redeem_code.clone(), p.redeemed, p.redeemed_at),
            _ => (false, None, None, None),
        };

        Self {
            id,
            name: submission.name,
            email: submission.email,
            phone: submission.phone.filter(|p| !p.trim().is_empty()),
            user_id: submission.user_id,
            timestamp: submission.timestamp,
            system_info: submission.system_info,
            won_prize,
            redeem_code,
            redeemed,
            redeemed_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DashboardStats {
    pub total_submissions: usize,
    pub winners: usize,
    pub non_winners: usize,
    pub redeemed: usize,
    /// 百分比，保留一位小数
    pub win_rate: f64,
    pub phone_rate: f64,
    pub remaining_prizes: i64,
}

impl DashboardStats {
    fn from_rows(rows: &[DashboardRow], remaining_prizes: i64) -> Self {
        let total = rows.len();
        let winners = rows.iter().filter(|r| r.won_prize).count();
        let redeemed = rows.iter().filter(|r| r.redeemed == Some(true)).count();
        let with_phone = rows.iter().filter(|r| r.phone.is_some()).count();

        Self {
            total_submissions: total,
            winners,
            non_winners: total - winners,
            redeemed,
            win_rate: percentage(winners, total),
            phone_rate: percentage(with_phone, total),
            remaining_prizes,
        }
    }
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 * 1000.0 / total as f64).round() / 10.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DashboardView {
    /// 按提交时间倒序
    pub submissions: Vec<DashboardRow>,
    pub remaining_prizes: i64,
    pub stats: DashboardStats,
}

impl DashboardView {
    /// 整体重算，不做增量
    pub fn build(
        submissions: Vec<(String, Submission)>,
        participants: Vec<(String, Participant)>,
        remaining_prizes: i64,
    ) -> Self {
        let participants: HashMap<String, Participant> = participants.into_iter().collect();

        let mut rows: Vec<DashboardRow> = submissions
            .into_iter()
            .map(|(id, submission)| {
                let participant = participants.get(&submission.user_id);
                DashboardRow::join(id, submission, participant)
            })
            .collect();
        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id)));

        let stats = DashboardStats::from_rows(&rows, remaining_prizes);
        Self {
            submissions: rows,
            remaining_prizes,
            stats,
        }
    }

    pub fn masked(mut self) -> Self {
        for row in &mut self.submissions {
            row.email = mask_email(&row.email);
            row.phone = row.phone.as_deref().map(mask_phone);
        }
        self
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DashboardQuery {
    /// 是否对邮箱和电话脱敏
    pub masked: Option<bool>,
}
