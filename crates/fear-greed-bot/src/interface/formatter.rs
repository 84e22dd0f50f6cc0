//! Message templates
//!
//! Every function here is pure: the same snapshot always renders to the same
//! bytes. Output uses the Telegram HTML subset (`<b>`, `<i>`).

use crate::bot::Query;
use crate::error::FetchError;
use crate::snapshot::{IndexSnapshot, Market};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

const DIVIDER: &str = "━━━━━━━━━━━━━━━━";
const MANUAL_PREFIX: &str = "📱 <b>手动查询</b>\n\n";

/// A scheduled push as shown in the welcome and help texts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushTime {
    /// e.g. "早间"
    pub label: String,
    /// e.g. "09:00"
    pub time: String,
}

/// How deltas are printed in a detail report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeltaStyle {
    /// `-5.0`
    OneDecimal,
    /// `-5`
    Integer,
}

/// Glyph for the direction of a change; zero counts as up
pub fn delta_glyph(delta: i16) -> &'static str {
    if delta >= 0 { "📈" } else { "📉" }
}

fn format_delta(delta: i16, style: DeltaStyle) -> String {
    let sign = if delta > 0 { "+" } else { "" };
    match style {
        DeltaStyle::OneDecimal => format!("{sign}{:.1}", f64::from(delta)),
        DeltaStyle::Integer => format!("{sign}{delta}"),
    }
}

/// Renders snapshots and the bot's fixed texts
#[derive(Debug, Clone)]
pub struct MessageFormatter {
    timezone: Tz,
    push_times: Vec<PushTime>,
}

impl MessageFormatter {
    pub fn new(timezone: Tz) -> Self {
        Self {
            timezone,
            push_times: Vec::new(),
        }
    }

    pub fn with_push_times(mut self, push_times: Vec<PushTime>) -> Self {
        self.push_times = push_times;
        self
    }

    /// `YYYY/MM/DD HH:MM` in the configured timezone
    pub fn format_timestamp(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.timezone)
            .format("%Y/%m/%d %H:%M")
            .to_string()
    }

    /// Detail report for whichever market produced the snapshot
    pub fn format_snapshot(&self, snapshot: &IndexSnapshot) -> String {
        match snapshot.market {
            Market::Stock => self.format_stock(snapshot),
            Market::Crypto => self.format_crypto(snapshot),
        }
    }

    pub fn format_stock(&self, snapshot: &IndexSnapshot) -> String {
        self.detail(
            "📊 <b>美股恐惧贪婪指数</b>",
            snapshot,
            DeltaStyle::OneDecimal,
        )
    }

    pub fn format_crypto(&self, snapshot: &IndexSnapshot) -> String {
        self.detail(
            "₿ <b>加密市场恐惧贪婪指数</b>",
            snapshot,
            DeltaStyle::Integer,
        )
    }

    fn detail(&self, header: &str, snapshot: &IndexSnapshot, style: DeltaStyle) -> String {
        let rating = snapshot.rating;
        let line = |label: &str, delta: i16, previous: u8| {
            format!(
                "{} {label}：{} ({previous})",
                delta_glyph(delta),
                format_delta(delta, style)
            )
        };

        format!(
            "{header}\n\n\
             {emoji} <b>当前指数：{score}</b>\n\
             💭 情绪状态：<b>{cn}</b> ({en})\n\n\
             {DIVIDER}\n\
             📈 <b>历史对比</b>\n\n\
             {close}\n\
             {week}\n\
             {month}\n\n\
             {DIVIDER}\n\
             🕐 更新时间：{time}\n\
             🔗 数据来源：{source}",
            emoji = rating.emoji(),
            score = snapshot.score,
            cn = rating.chinese(),
            en = rating.english(),
            close = line("较昨日", snapshot.close_delta(), snapshot.previous_close),
            week = line("较上周", snapshot.week_delta(), snapshot.previous_week),
            month = line("较上月", snapshot.month_delta(), snapshot.previous_month),
            time = self.format_timestamp(snapshot.captured_at),
            source = snapshot.market.source_name(),
        )
    }

    /// Both markets in one message; the update time comes from the stock read
    pub fn format_combined(&self, stock: &IndexSnapshot, crypto: &IndexSnapshot) -> String {
        let history = |s: &IndexSnapshot| {
            format!(
                "昨日：{} | 上周：{} | 上月：{}",
                s.previous_close, s.previous_week, s.previous_month
            )
        };

        format!(
            "📊 <b>美股恐惧贪婪指数</b>\n\
             {stock_emoji} 当前：<b>{stock_score}</b> | {stock_cn}\n\n\
             ₿ <b>加密恐惧贪婪指数</b>\n\
             {crypto_emoji} 当前：<b>{crypto_score}</b> | {crypto_cn}\n\n\
             {DIVIDER}\n\
             📊 <b>美股历史对比</b>\n\
             {stock_history}\n\n\
             ₿ <b>加密历史对比</b>\n\
             {crypto_history}\n\n\
             {DIVIDER}\n\
             🕐 更新时间：{time}\n\n\
             <i>使用 /stock 查看美股详情\n\
             使用 /crypto 查看加密详情</i>",
            stock_emoji = stock.rating.emoji(),
            stock_score = stock.score,
            stock_cn = stock.rating.chinese(),
            crypto_emoji = crypto.rating.emoji(),
            crypto_score = crypto.score,
            crypto_cn = crypto.rating.chinese(),
            stock_history = history(stock),
            crypto_history = history(crypto),
            time = self.format_timestamp(stock.captured_at),
        )
    }

    /// Prepend the marker shown on command-triggered reports
    pub fn mark_manual(&self, body: &str) -> String {
        format!("{MANUAL_PREFIX}{body}")
    }

    /// Transient text shown while a query is being fetched
    pub fn placeholder(&self, query: Query) -> &'static str {
        match query {
            Query::Stock => "⏳ 正在查询美股指数...",
            Query::Crypto => "⏳ 正在查询加密指数...",
            Query::Both => "⏳ 正在查询两个市场数据...",
        }
    }

    /// Reply sent when a query's fetch fails
    pub fn format_fetch_error(&self, query: Query, err: &FetchError) -> String {
        let scope = match query {
            Query::Stock => Market::Stock.display_name(),
            Query::Crypto => Market::Crypto.display_name(),
            Query::Both => "",
        };
        format!("⚠️ 获取{scope}数据失败\n\n错误：{}", err.user_message())
    }

    fn push_summary(&self) -> String {
        if self.push_times.is_empty() {
            return "未配置".to_string();
        }
        self.push_times
            .iter()
            .map(|p| p.time.as_str())
            .collect::<Vec<_>>()
            .join(" 和 ")
    }

    pub fn welcome_text(&self) -> String {
        let schedule: String = self
            .push_times
            .iter()
            .map(|p| format!("\n• {}：{}", p.label, p.time))
            .collect();

        format!(
            "👋 欢迎使用恐惧贪婪指数机器人！\n\n\
             📊 <b>功能介绍：</b>\n\
             • 每天 {summary} 自动推送\n\
             • 支持美股和加密市场指数\n\
             • 多种查询命令\n\n\
             🔔 <b>可用命令：</b>\n\
             /stock - 查询美股指数 📊\n\
             /crypto - 查询加密指数 ₿\n\
             /both - 同时查看两个市场 📊₿\n\
             /help - 查看帮助信息\n\n\
             🕐 <b>推送时间（{tz}）：</b>{schedule}\n\n\
             💡 立即输入命令开始查询！",
            summary = self.push_summary(),
            tz = self.timezone.name(),
        )
    }

    pub fn help_text(&self) -> String {
        format!(
            "📖 <b>使用说明</b>\n\n\
             <b>📊 查询命令：</b>\n\
             /stock - 查询美股恐惧贪婪指数\n\
             /crypto - 查询加密市场恐惧贪婪指数\n\
             /both - 同时查看两个市场\n\
             /check - 查询美股指数（兼容旧版）\n\n\
             <b>⚙️ 其他命令：</b>\n\
             /start - 启动机器人\n\
             /help - 查看此帮助信息\n\n\
             <b>🔔 自动推送：</b>\n\
             机器人会在每天 {summary}（{tz}）自动推送美股和加密市场指数。\n\n\
             <b>📊 指数说明：</b>\n\
             • 0-25：极度恐惧 😱\n\
             • 26-45：恐惧 😰\n\
             • 46-55：中性 😐\n\
             • 56-75：贪婪 😃\n\
             • 76-100：极度贪婪 🤑\n\n\
             <b>🔗 数据来源：</b>\n\
             • 美股：CNN Fear & Greed Index\n\
             • 加密：Alternative.me Crypto Index\n\n\
             💡 提示：指数仅供参考，投资需谨慎！",
            summary = self.push_summary(),
            tz = self.timezone.name(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Rating;
    use chrono::TimeZone;

    fn snapshot(market: Market, score: u8, close: u8, week: u8, month: u8) -> IndexSnapshot {
        IndexSnapshot {
            market,
            score,
            rating: Rating::from_score(score),
            previous_close: close,
            previous_week: week,
            previous_month: month,
            captured_at: Utc.with_ymd_and_hms(2024, 1, 5, 23, 59, 57).unwrap(),
        }
    }

    fn formatter() -> MessageFormatter {
        MessageFormatter::new(chrono_tz::Asia::Shanghai).with_push_times(vec![
            PushTime {
                label: "早间".to_string(),
                time: "09:00".to_string(),
            },
            PushTime {
                label: "晚间".to_string(),
                time: "21:00".to_string(),
            },
        ])
    }

    #[test]
    fn test_glyph_boundary() {
        assert_eq!(delta_glyph(0), "📈");
        assert_eq!(delta_glyph(1), "📈");
        assert_eq!(delta_glyph(-1), "📉");
    }

    #[test]
    fn test_delta_styles() {
        assert_eq!(format_delta(-5, DeltaStyle::OneDecimal), "-5.0");
        assert_eq!(format_delta(3, DeltaStyle::OneDecimal), "+3.0");
        assert_eq!(format_delta(0, DeltaStyle::OneDecimal), "0.0");
        assert_eq!(format_delta(-5, DeltaStyle::Integer), "-5");
        assert_eq!(format_delta(12, DeltaStyle::Integer), "+12");
        assert_eq!(format_delta(0, DeltaStyle::Integer), "0");
    }

    #[test]
    fn test_timestamp_in_configured_zone() {
        let at = Utc.with_ymd_and_hms(2024, 1, 5, 23, 59, 57).unwrap();
        assert_eq!(formatter().format_timestamp(at), "2024/01/06 07:59");
    }

    #[test]
    fn test_stock_detail() {
        let text = formatter().format_stock(&snapshot(Market::Stock, 25, 30, 20, 25));

        assert!(text.starts_with("📊 <b>美股恐惧贪婪指数</b>"));
        assert!(text.contains("😱 <b>当前指数：25</b>"));
        assert!(text.contains("📉 较昨日：-5.0 (30)"));
        assert!(text.contains("📈 较上周：+5.0 (20)"));
        assert!(text.contains("📈 较上月：0.0 (25)"));
        assert!(text.contains("🕐 更新时间：2024/01/06 07:59"));
        assert!(text.ends_with("🔗 数据来源：CNN Fear & Greed Index"));
    }

    #[test]
    fn test_crypto_detail_uses_integer_deltas() {
        let text = formatter().format_crypto(&snapshot(Market::Crypto, 72, 70, 80, 72));

        assert!(text.starts_with("₿ <b>加密市场恐惧贪婪指数</b>"));
        assert!(text.contains("💭 情绪状态：<b>贪婪</b> (Greed)"));
        assert!(text.contains("📈 较昨日：+2 (70)"));
        assert!(text.contains("📉 较上周：-8 (80)"));
        assert!(text.contains("📈 较上月：0 (72)"));
        assert!(text.ends_with("🔗 数据来源：Alternative.me"));
    }

    #[test]
    fn test_format_snapshot_dispatches_on_market() {
        let f = formatter();
        let crypto = snapshot(Market::Crypto, 50, 50, 50, 50);
        assert_eq!(f.format_snapshot(&crypto), f.format_crypto(&crypto));
    }

    #[test]
    fn test_combined() {
        let stock = snapshot(Market::Stock, 25, 30, 20, 40);
        let crypto = snapshot(Market::Crypto, 80, 78, 60, 55);
        let text = formatter().format_combined(&stock, &crypto);

        assert!(text.contains("😱 当前：<b>25</b> | 极度恐惧"));
        assert!(text.contains("🤑 当前：<b>80</b> | 极度贪婪"));
        assert!(text.contains("昨日：30 | 上周：20 | 上月：40"));
        assert!(text.contains("昨日：78 | 上周：60 | 上月：55"));
        assert!(text.ends_with("使用 /crypto 查看加密详情</i>"));
    }

    #[test]
    fn test_formatting_is_deterministic() {
        let f = formatter();
        let s = snapshot(Market::Stock, 61, 58, 70, 45);
        assert_eq!(f.format_stock(&s), f.format_stock(&s.clone()));
        assert_eq!(f.format_combined(&s, &s), f.format_combined(&s, &s));
    }

    #[test]
    fn test_fetch_error_reply() {
        let err = FetchError::Timeout {
            market: Market::Stock,
        };
        assert_eq!(
            formatter().format_fetch_error(Query::Stock, &err),
            "⚠️ 获取美股数据失败\n\n错误：无法获取美股数据，请稍后重试（请求超时）"
        );
        assert!(formatter()
            .format_fetch_error(Query::Both, &err)
            .starts_with("⚠️ 获取数据失败"));
    }

    #[test]
    fn test_welcome_and_help_list_push_times() {
        let f = formatter();
        let welcome = f.welcome_text();
        assert!(welcome.contains("• 每天 09:00 和 21:00 自动推送"));
        assert!(welcome.contains("• 早间：09:00"));
        assert!(welcome.contains("推送时间（Asia/Shanghai）"));
        assert!(f.help_text().contains("每天 09:00 和 21:00（Asia/Shanghai）"));
    }

    #[test]
    fn test_manual_prefix() {
        assert_eq!(
            formatter().mark_manual("body"),
            "📱 <b>手动查询</b>\n\nbody"
        );
    }
}
