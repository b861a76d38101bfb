//! Dashboard HTML page handler for the memory vault service.

use crate::routes::AppState;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use memory_vault_types::MemoryRecord;
use std::sync::Arc;

/// How many of the newest memories the dashboard lists.
const RECENT_LIMIT: usize = 50;

pub async fn dashboard(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let stats = state.db.get_stats().ok();
    let memories = state.db.list_memories().unwrap_or_default();
    let uptime = state.start_time.elapsed().as_secs();

    let stats_html = if let Some(s) = &stats {
        format!(
            r#"<div class="stats">
                <div class="stat"><span class="val">{}</span><span class="lbl">Memories</span></div>
                <div class="stat green"><span class="val">{}</span><span class="lbl">Recognizable</span></div>
                <div class="stat yellow"><span class="val">{}</span><span class="lbl">Voice Profiles</span></div>
                <div class="stat"><span class="val">{}</span><span class="lbl">User Profile</span></div>
            </div>"#,
            s.total_memories,
            s.recognition_profiles,
            s.voice_profiles,
            if s.has_user_profile { "yes" } else { "no" },
        )
    } else {
        "<p>No stats available.</p>".to_string()
    };

    let mut rows = String::new();
    for m in memories.iter().take(RECENT_LIMIT) {
        rows.push_str(&memory_row(m));
    }
    if rows.is_empty() {
        rows = "<tr><td colspan=\"5\">No memories yet.</td></tr>".to_string();
    }

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Memory Vault Dashboard</title>
<style>
  * {{ margin: 0; padding: 0; box-sizing: border-box; }}
  body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background: #0f1117; color: #e0e0e0; padding: 20px; }}
  h1 {{ color: #3fb950; margin-bottom: 8px; }}
  .meta {{ color: #8b949e; font-size: 0.85em; margin-bottom: 20px; }}
  .stats {{ display: flex; gap: 16px; margin-bottom: 24px; flex-wrap: wrap; }}
  .stat {{ background: #161b22; border: 1px solid #30363d; border-radius: 8px; padding: 16px 24px; text-align: center; min-width: 140px; }}
  .stat .val {{ display: block; font-size: 2em; font-weight: bold; color: #58a6ff; }}
  .stat.green .val {{ color: #3fb950; }}
  .stat.yellow .val {{ color: #d29922; }}
  .stat .lbl {{ display: block; font-size: 0.85em; color: #8b949e; margin-top: 4px; }}
  table {{ width: 100%; border-collapse: collapse; margin-bottom: 24px; }}
  th {{ background: #161b22; color: #8b949e; text-align: left; padding: 8px 12px; font-size: 0.85em; text-transform: uppercase; border-bottom: 1px solid #30363d; }}
  td {{ padding: 8px 12px; border-bottom: 1px solid #21262d; font-size: 0.9em; }}
  tr:hover {{ background: #161b22; }}
  .mono {{ font-family: 'SF Mono', 'Consolas', monospace; font-size: 0.85em; }}
  h2 {{ color: #c9d1d9; margin-bottom: 12px; font-size: 1.1em; }}
  .chip {{ display: inline-block; background: #21262d; border: 1px solid #30363d; color: #8b949e; padding: 2px 8px; border-radius: 12px; font-size: 0.8em; }}
</style>
</head>
<body>
  <h1>Memory Vault</h1>
  <p class="meta">Uptime: {uptime_str}</p>

  {stats_html}

  <h2>Recent Memories</h2>
  <table>
    <thead><tr><th>#</th><th>Name</th><th>Type</th><th>Content</th><th>Saved</th></tr></thead>
    <tbody>{rows}</tbody>
  </table>

  <script>setTimeout(() => location.reload(), 30000);</script>
</body>
</html>"#,
        uptime_str = format_uptime(uptime),
        stats_html = stats_html,
        rows = rows,
    );

    ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], html)
}

fn memory_row(m: &MemoryRecord) -> String {
    let content = m.content.as_deref().unwrap_or("");
    let preview: String = content.chars().take(80).collect();
    let ellipsis = if content.chars().count() > 80 { "..." } else { "" };
    format!(
        "<tr><td class=\"mono\">{}</td><td>{}</td><td><span class=\"chip\">{}</span></td><td>{}{}</td><td class=\"mono\">{}</td></tr>\n",
        m.id,
        escape_html(&m.name),
        m.kind.as_str(),
        escape_html(&preview),
        ellipsis,
        escape_html(&m.created_at),
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn format_uptime(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(5), "5s");
        assert_eq!(format_uptime(125), "2m 5s");
        assert_eq!(format_uptime(3725), "1h 2m 5s");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href=\"x\">&</a>"), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
    }
}
