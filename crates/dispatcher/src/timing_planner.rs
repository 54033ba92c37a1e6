use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use courier_core::{CourierError, CourierResult};
use courier_domain::entities::{Campaign, SendWindow, TimingStrategy};
use courier_domain::repositories::SendRepository;

/// 把时间压入允许发送的窗口
///
/// 正常窗口(start <= end): 早于窗口起点的时间移到当天起点，
/// 晚于窗口终点的时间移到次日起点。
/// 跨夜窗口(start > end，如22:00-06:00): 严格处于终点与起点之间的
/// 时间前移到当天起点，其余时间原样通过。
/// 未配置窗口时是恒等函数。
pub fn clamp_to_window(t: DateTime<Utc>, window: Option<&SendWindow>) -> DateTime<Utc> {
    let Some(window) = window else {
        return t;
    };
    let tod = t.time();

    if window.start <= window.end {
        if tod < window.start {
            t.date_naive().and_time(window.start).and_utc()
        } else if tod > window.end {
            (t.date_naive() + Duration::days(1))
                .and_time(window.start)
                .and_utc()
        } else {
            t
        }
    } else if tod > window.end && tod < window.start {
        t.date_naive().and_time(window.start).and_utc()
    } else {
        t
    }
}

/// 发送时间规划器
///
/// 在收件人解析完成后立即执行一次，为每条尚未规划的pending投递行
/// 计算发送时间。随机源通过构造注入，便于测试复现。
pub struct TimingPlanner {
    send_repo: Arc<dyn SendRepository>,
    rng: Mutex<StdRng>,
}

impl TimingPlanner {
    pub fn new(send_repo: Arc<dyn SendRepository>) -> Self {
        Self {
            send_repo,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    pub fn with_seed(send_repo: Arc<dyn SendRepository>, seed: u64) -> Self {
        Self {
            send_repo,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// 为活动的全部未规划行分配发送时间，返回处理的行数
    pub async fn plan(&self, campaign: &Campaign) -> CourierResult<usize> {
        let rows = self.send_repo.find_unplanned(campaign.id).await?;
        if rows.is_empty() {
            debug!("活动 {} 没有待规划的投递行", campaign.id);
            return Ok(0);
        }

        let window = campaign.timing.send_window.as_ref();
        let now = Utc::now();
        let due_times = self.compute_due_times(campaign, now, window, rows.len())?;

        for (row, due) in rows.iter().zip(due_times.iter()) {
            self.send_repo.set_due_at(row.id, *due).await?;
        }

        info!(
            "活动 {} 已为 {} 条投递行规划发送时间(策略 {:?})",
            campaign.id,
            rows.len(),
            campaign.timing.strategy
        );

        Ok(rows.len())
    }

    fn compute_due_times(
        &self,
        campaign: &Campaign,
        now: DateTime<Utc>,
        window: Option<&SendWindow>,
        count: usize,
    ) -> CourierResult<Vec<DateTime<Utc>>> {
        let due_times = match campaign.timing.strategy {
            TimingStrategy::Immediate => {
                // 共享时间戳只压窗一次，整批同值
                let due = clamp_to_window(now, window);
                vec![due; count]
            }
            TimingStrategy::Fixed => {
                let due = campaign.scheduled_at.unwrap_or(now);
                vec![due; count]
            }
            TimingStrategy::Staggered => {
                let interval = campaign.timing.stagger_interval_minutes;
                (0..count as i64)
                    .map(|i| clamp_to_window(now + Duration::minutes(i * interval), window))
                    .collect()
            }
            TimingStrategy::Drip => {
                let mut lo = campaign.timing.drip_min_minutes;
                let mut hi = campaign.timing.drip_max_minutes;
                if lo > hi {
                    std::mem::swap(&mut lo, &mut hi);
                }

                let mut rng = self
                    .rng
                    .lock()
                    .map_err(|_| CourierError::Internal("随机源锁中毒".to_string()))?;

                // 下一次抽取以上一行压窗后的时间为基准，
                // 避免跨过窗口边界后累计偏移不断放大
                let mut cursor = now;
                (0..count)
                    .map(|_| {
                        let step = rng.random_range(lo..=hi);
                        cursor = clamp_to_window(cursor + Duration::minutes(step), window);
                        cursor
                    })
                    .collect()
            }
        };

        Ok(due_times)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn window(start: &str, end: &str) -> SendWindow {
        SendWindow {
            start: NaiveTime::parse_from_str(start, "%H:%M").unwrap(),
            end: NaiveTime::parse_from_str(end, "%H:%M").unwrap(),
        }
    }

    fn at(time: &str) -> DateTime<Utc> {
        format!("2026-08-10T{time}:00Z").parse().unwrap()
    }

    #[test]
    fn test_clamp_without_window_is_identity() {
        let t = at("18:30");
        assert_eq!(clamp_to_window(t, None), t);
    }

    #[test]
    fn test_clamp_after_end_moves_to_next_day_start() {
        let w = window("09:00", "17:00");
        assert_eq!(clamp_to_window(at("18:30"), Some(&w)), at("09:00") + Duration::days(1));
    }

    #[test]
    fn test_clamp_before_start_moves_to_same_day_start() {
        let w = window("09:00", "17:00");
        assert_eq!(clamp_to_window(at("07:00"), Some(&w)), at("09:00"));
    }

    #[test]
    fn test_clamp_inside_window_passes_through() {
        let w = window("09:00", "17:00");
        assert_eq!(clamp_to_window(at("12:00"), Some(&w)), at("12:00"));
    }

    #[test]
    fn test_overnight_clamp_between_end_and_start_moves_to_start() {
        let w = window("22:00", "06:00");
        assert_eq!(clamp_to_window(at("10:00"), Some(&w)), at("22:00"));
    }

    #[test]
    fn test_overnight_clamp_inside_window_passes_through() {
        let w = window("22:00", "06:00");
        assert_eq!(clamp_to_window(at("23:00"), Some(&w)), at("23:00"));
        assert_eq!(clamp_to_window(at("05:30"), Some(&w)), at("05:30"));
    }

    #[test]
    fn test_overnight_clamp_boundaries_pass_through() {
        // 严格介于终点与起点之间才前移，边界本身不动
        let w = window("22:00", "06:00");
        assert_eq!(clamp_to_window(at("22:00"), Some(&w)), at("22:00"));
        assert_eq!(clamp_to_window(at("06:00"), Some(&w)), at("06:00"));
    }
}
