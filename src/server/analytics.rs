// src/server/analytics.rs
//
// Load analytics for the public script endpoint. One JSON document holds the
// global counter, per-script stats and a bounded event history. The document
// lives in memory behind a mutex; every mutation is written out whole via
// temp file + rename before it becomes visible.

use crate::core::constants::{
    MAX_HISTORY, MAX_UNIQUE_IPS, RECENT_ACTIVITY_LIMIT, TOP_SCRIPTS_LIMIT,
};
use crate::core::prelude::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsDocument {
    #[serde(default)]
    pub total_loads: u64,
    #[serde(default)]
    pub scripts: BTreeMap<String, ScriptStat>,
    #[serde(default)]
    pub history: VecDeque<LoadEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptStat {
    pub total_loads: u64,
    pub first_load: DateTime<Utc>,
    pub last_load: DateTime<Utc>,
    #[serde(default)]
    pub unique_ips: VecDeque<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadEvent {
    pub timestamp: DateTime<Utc>,
    pub script: String,
    pub ip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub total_scripts: usize,
    pub total_loads: u64,
    pub top_scripts: Vec<TopScript>,
    pub recent_activity: Vec<LoadEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopScript {
    pub script: String,
    pub total_loads: u64,
    pub unique_ips: usize,
    pub last_load: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScriptStats {
    pub script: String,
    pub total_loads: u64,
    pub unique_ips: usize,
    pub first_load: Option<DateTime<Utc>>,
    pub last_load: Option<DateTime<Utc>>,
    pub last_ip: Option<String>,
}

/// Append and drop from the front until `cap` holds.
fn push_capped<T>(queue: &mut VecDeque<T>, item: T, cap: usize) {
    queue.push_back(item);
    while queue.len() > cap {
        queue.pop_front();
    }
}

fn trim_front<T>(queue: &mut VecDeque<T>, cap: usize) {
    while queue.len() > cap {
        queue.pop_front();
    }
}

impl AnalyticsDocument {
    pub fn record(&mut self, identity: &str, ip: Option<&str>, at: DateTime<Utc>) {
        self.total_loads += 1;

        let stat = self
            .scripts
            .entry(identity.to_string())
            .or_insert_with(|| ScriptStat {
                total_loads: 0,
                first_load: at,
                last_load: at,
                unique_ips: VecDeque::new(),
            });
        stat.total_loads += 1;
        stat.last_load = at;

        if let Some(ip) = ip {
            if !stat.unique_ips.iter().any(|known| known == ip) {
                push_capped(&mut stat.unique_ips, ip.to_string(), MAX_UNIQUE_IPS);
            }
        }

        push_capped(
            &mut self.history,
            LoadEvent {
                timestamp: at,
                script: identity.to_string(),
                ip: ip.map(str::to_string),
            },
            MAX_HISTORY,
        );
    }

    pub fn overview(&self) -> Overview {
        let mut ranked: Vec<(&String, &ScriptStat)> = self.scripts.iter().collect();
        // stable: ties stay in identity order
        ranked.sort_by(|a, b| b.1.total_loads.cmp(&a.1.total_loads));

        let top_scripts = ranked
            .into_iter()
            .take(TOP_SCRIPTS_LIMIT)
            .map(|(script, stat)| TopScript {
                script: script.clone(),
                total_loads: stat.total_loads,
                unique_ips: stat.unique_ips.len(),
                last_load: stat.last_load,
            })
            .collect();

        let recent_activity = self
            .history
            .iter()
            .rev()
            .take(RECENT_ACTIVITY_LIMIT)
            .cloned()
            .collect();

        Overview {
            total_scripts: self.scripts.len(),
            total_loads: self.total_loads,
            top_scripts,
            recent_activity,
        }
    }

    /// Unknown identities yield a zeroed record.
    pub fn script_stats(&self, identity: &str) -> ScriptStats {
        let last_ip = self
            .history
            .iter()
            .rev()
            .filter(|event| event.script == identity)
            .find_map(|event| event.ip.clone());

        match self.scripts.get(identity) {
            Some(stat) => ScriptStats {
                script: identity.to_string(),
                total_loads: stat.total_loads,
                unique_ips: stat.unique_ips.len(),
                first_load: Some(stat.first_load),
                last_load: Some(stat.last_load),
                last_ip,
            },
            None => ScriptStats {
                script: identity.to_string(),
                total_loads: 0,
                unique_ips: 0,
                first_load: None,
                last_load: None,
                last_ip: None,
            },
        }
    }

    /// Documents written by other tools may exceed the caps.
    fn enforce_bounds(&mut self) {
        trim_front(&mut self.history, MAX_HISTORY);
        for stat in self.scripts.values_mut() {
            trim_front(&mut stat.unique_ips, MAX_UNIQUE_IPS);
        }
    }
}

pub struct AnalyticsStore {
    file_path: PathBuf,
    document: Mutex<AnalyticsDocument>,
}

impl AnalyticsStore {
    /// Missing file: start empty and write it. Unreadable or malformed file: error.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file_path = path.as_ref().to_path_buf();

        let document = if file_path.exists() {
            let content = tokio::fs::read_to_string(&file_path).await?;
            let mut document = if content.trim().is_empty() {
                AnalyticsDocument::default()
            } else {
                serde_json::from_str::<AnalyticsDocument>(&content).map_err(|e| {
                    AppError::Corrupt(format!(
                        "Failed to parse analytics file {}: {}",
                        file_path.display(),
                        e
                    ))
                })?
            };
            document.enforce_bounds();
            log::info!(
                "Analytics loaded: {} loads across {} scripts",
                document.total_loads,
                document.scripts.len()
            );
            document
        } else {
            if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            let document = AnalyticsDocument::default();
            save_to_file(&file_path, &document).await?;
            log::info!("Analytics initialized at {:?}", file_path);
            document
        };

        Ok(Self {
            file_path,
            document: Mutex::new(document),
        })
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub async fn record_load(&self, identity: &str, ip: Option<&str>) -> Result<()> {
        let mut document = self.document.lock().await;
        let mut next = document.clone();
        next.record(identity, ip, Utc::now());
        save_to_file(&self.file_path, &next).await?;
        *document = next;
        log::debug!("Load recorded for {} ({:?})", identity, ip);
        Ok(())
    }

    pub async fn overview(&self) -> Overview {
        self.document.lock().await.overview()
    }

    pub async fn script_stats(&self, identity: &str) -> ScriptStats {
        self.document.lock().await.script_stats(identity)
    }

    pub async fn reset(&self) -> Result<()> {
        let mut document = self.document.lock().await;
        let empty = AnalyticsDocument::default();
        save_to_file(&self.file_path, &empty).await?;
        *document = empty;
        log::info!("Analytics reset");
        Ok(())
    }
}

async fn save_to_file(path: &Path, document: &AnalyticsDocument) -> Result<()> {
    let content = serde_json::to_string_pretty(document)
        .map_err(|e| AppError::Corrupt(format!("Failed to serialize analytics: {}", e)))?;

    let temp_path = path.with_extension("tmp");
    tokio::fs::write(&temp_path, content).await?;
    tokio::fs::rename(&temp_path, path).await?;
    Ok(())
}

/// Dashboard HTML template. The placeholder `__ANALYTICS_DATA__` is replaced
/// with the current overview JSON at render time.
pub const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8"><meta name="viewport" content="width=device-width,initial-scale=1.0">
<title>Analytics - Script Shelf</title>
<style>
*{margin:0;padding:0;box-sizing:border-box}
body{font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',sans-serif;background:#1e1e1e;color:#d4d4d4;min-height:100vh}
.container{max-width:1100px;margin:0 auto;padding:24px}
.header{display:flex;justify-content:space-between;align-items:center;margin-bottom:24px}
.header h1{font-size:22px;font-weight:700}
.header h1 span{color:#4ec9b0}
.header a,.header button{color:#4ec9b0;text-decoration:none;font-size:14px;background:none;border:1px solid #3e3e42;border-radius:6px;padding:6px 12px;cursor:pointer;margin-left:8px}
.header button.danger{color:#f48771;border-color:#f48771}
.cards{display:grid;grid-template-columns:repeat(auto-fit,minmax(200px,1fr));gap:16px;margin-bottom:24px}
.card{background:#252526;border:1px solid #3e3e42;border-radius:10px;padding:20px}
.card .lbl{font-size:12px;color:#858585;text-transform:uppercase;letter-spacing:0.5px;margin-bottom:8px}
.card .val{font-size:34px;font-weight:700;color:#4ec9b0}
.section{background:#252526;border:1px solid #3e3e42;border-radius:10px;padding:20px;margin-bottom:16px}
.section h2{font-size:15px;margin-bottom:16px;font-weight:600}
table{width:100%;border-collapse:collapse}
th{text-align:left;font-size:11px;color:#858585;text-transform:uppercase;padding:8px 0;border-bottom:1px solid #3e3e42}
td{padding:8px 0;font-size:13px;border-bottom:1px solid #2d2d30;font-family:Consolas,monospace}
.empty{color:#666;font-style:italic;font-size:13px;padding:20px;text-align:center}
</style>
</head>
<body>
<div class="container">
<div class="header"><h1>Script <span>Analytics</span></h1>
<div><a href="/">&larr; Editor</a><button class="danger" id="reset">Reset</button></div></div>
<div class="cards" id="cards"></div>
<div class="section"><h2>Top Scripts</h2><div id="top"></div></div>
<div class="section"><h2>Recent Activity</h2><div id="recent"></div></div>
</div>
<script>
var D=__ANALYTICS_DATA__;
function esc(s){var d=document.createElement('div');d.textContent=s==null?'-':String(s);return d.innerHTML}
function when(t){return t?new Date(t).toLocaleString():'-'}
document.getElementById('cards').innerHTML='<div class="card"><div class="lbl">Total Loads</div><div class="val">'+D.total_loads+'</div></div>'+'<div class="card"><div class="lbl">Scripts Tracked</div><div class="val">'+D.total_scripts+'</div></div>';
var t=D.top_scripts||[];
document.getElementById('top').innerHTML=t.length===0?'<div class="empty">No loads yet</div>':'<table><tr><th>Script</th><th>Loads</th><th>Unique IPs</th><th>Last Load</th></tr>'+t.map(function(x){return '<tr><td>'+esc(x.script)+'</td><td>'+x.total_loads+'</td><td>'+x.unique_ips+'</td><td>'+when(x.last_load)+'</td></tr>'}).join('')+'</table>';
var r=D.recent_activity||[];
document.getElementById('recent').innerHTML=r.length===0?'<div class="empty">No activity yet</div>':'<table><tr><th>Time</th><th>Script</th><th>IP</th></tr>'+r.map(function(x){return '<tr><td>'+when(x.timestamp)+'</td><td>'+esc(x.script)+'</td><td>'+esc(x.ip)+'</td></tr>'}).join('')+'</table>';
document.getElementById('reset').addEventListener('click',function(){if(!confirm('Reset all analytics?'))return;fetch('/api/analytics/reset',{method:'POST'}).then(function(){location.reload()})});
setTimeout(function(){location.reload()},30000);
</script>
</body></html>"#;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn at(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + seconds, 0).unwrap()
    }

    #[test]
    fn test_counts_per_identity() {
        let mut doc = AnalyticsDocument::default();
        doc.record("a/one.lua", Some("1.1.1.1"), at(0));
        doc.record("a/two.lua", Some("1.1.1.1"), at(1));
        doc.record("a/one.lua", None, at(2));

        assert_eq!(doc.total_loads, 3);
        assert_eq!(doc.scripts["a/one.lua"].total_loads, 2);
        assert_eq!(doc.scripts["a/two.lua"].total_loads, 1);
        assert_eq!(doc.history.len(), 3);
    }

    #[test]
    fn test_timestamps() {
        let mut doc = AnalyticsDocument::default();
        doc.record("a/x.lua", None, at(0));
        doc.record("a/x.lua", None, at(60));
        let stat = &doc.scripts["a/x.lua"];
        assert_eq!(stat.first_load, at(0));
        assert_eq!(stat.last_load, at(60));
        assert_eq!(stat.last_load - stat.first_load, TimeDelta::seconds(60));
    }

    #[test]
    fn test_unique_ips_fifo_bound() {
        let mut doc = AnalyticsDocument::default();
        for i in 0..150 {
            doc.record("a/x.lua", Some(&format!("10.0.0.{}", i)), at(i));
        }
        let ips = &doc.scripts["a/x.lua"].unique_ips;
        assert_eq!(ips.len(), MAX_UNIQUE_IPS);
        assert_eq!(ips.front().map(String::as_str), Some("10.0.0.50"));
        assert_eq!(ips.back().map(String::as_str), Some("10.0.0.149"));
    }

    #[test]
    fn test_repeat_ip_not_duplicated() {
        let mut doc = AnalyticsDocument::default();
        doc.record("a/x.lua", Some("1.1.1.1"), at(0));
        doc.record("a/x.lua", Some("2.2.2.2"), at(1));
        doc.record("a/x.lua", Some("1.1.1.1"), at(2));
        let ips: Vec<_> = doc.scripts["a/x.lua"].unique_ips.iter().cloned().collect();
        assert_eq!(ips, vec!["1.1.1.1", "2.2.2.2"]);
    }

    #[test]
    fn test_missing_ip_still_counts() {
        let mut doc = AnalyticsDocument::default();
        doc.record("a/x.lua", None, at(0));
        assert_eq!(doc.total_loads, 1);
        assert!(doc.scripts["a/x.lua"].unique_ips.is_empty());
        assert_eq!(doc.history[0].ip, None);
    }

    #[test]
    fn test_history_keeps_most_recent() {
        let mut doc = AnalyticsDocument::default();
        for i in 0..1500 {
            doc.record(&format!("f/{}.lua", i), None, at(i));
        }
        assert_eq!(doc.total_loads, 1500);
        assert_eq!(doc.history.len(), MAX_HISTORY);
        assert_eq!(doc.history.front().unwrap().script, "f/500.lua");
        assert_eq!(doc.history.back().unwrap().script, "f/1499.lua");
        assert!(doc
            .history
            .iter()
            .zip(doc.history.iter().skip(1))
            .all(|(a, b)| a.timestamp < b.timestamp));
        // stats outlive trimmed history
        assert_eq!(doc.scripts["f/0.lua"].total_loads, 1);
    }

    #[test]
    fn test_overview_top_and_recent() {
        let mut doc = AnalyticsDocument::default();
        for i in 0..12 {
            for n in 0..=i {
                doc.record(&format!("f/s{:02}.lua", i), None, at(i * 100 + n));
            }
        }
        let overview = doc.overview();
        assert_eq!(overview.total_scripts, 12);
        assert_eq!(overview.top_scripts.len(), TOP_SCRIPTS_LIMIT);
        assert_eq!(overview.top_scripts[0].script, "f/s11.lua");
        assert_eq!(overview.top_scripts[0].total_loads, 12);
        assert_eq!(overview.top_scripts[9].script, "f/s02.lua");

        assert_eq!(overview.recent_activity.len(), RECENT_ACTIVITY_LIMIT);
        assert_eq!(overview.recent_activity[0].timestamp, at(1111));
        assert!(overview
            .recent_activity
            .iter()
            .zip(overview.recent_activity.iter().skip(1))
            .all(|(a, b)| a.timestamp > b.timestamp));
    }

    #[test]
    fn test_overview_ties_in_identity_order() {
        let mut doc = AnalyticsDocument::default();
        doc.record("b/x.lua", None, at(0));
        doc.record("a/x.lua", None, at(1));
        doc.record("c/x.lua", None, at(2));
        let names: Vec<_> = doc
            .overview()
            .top_scripts
            .into_iter()
            .map(|t| t.script)
            .collect();
        assert_eq!(names, vec!["a/x.lua", "b/x.lua", "c/x.lua"]);
    }

    #[test]
    fn test_script_stats_last_ip() {
        let mut doc = AnalyticsDocument::default();
        doc.record("a/x.lua", Some("1.1.1.1"), at(0));
        doc.record("a/y.lua", Some("9.9.9.9"), at(1));
        doc.record("a/x.lua", Some("2.2.2.2"), at(2));
        doc.record("a/x.lua", None, at(3));

        let stats = doc.script_stats("a/x.lua");
        assert_eq!(stats.total_loads, 3);
        assert_eq!(stats.unique_ips, 2);
        assert_eq!(stats.first_load, Some(at(0)));
        assert_eq!(stats.last_load, Some(at(3)));
        assert_eq!(stats.last_ip.as_deref(), Some("2.2.2.2"));
    }

    #[test]
    fn test_script_stats_unknown_is_zero() {
        let doc = AnalyticsDocument::default();
        let stats = doc.script_stats("nope/none.lua");
        assert_eq!(stats.total_loads, 0);
        assert_eq!(stats.unique_ips, 0);
        assert_eq!(stats.first_load, None);
        assert_eq!(stats.last_load, None);
        assert_eq!(stats.last_ip, None);
    }

    #[test]
    fn test_json_shape() {
        let mut doc = AnalyticsDocument::default();
        doc.record("alpha/loader.lua", None, at(0));
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["total_loads"], 1);
        assert_eq!(value["scripts"]["alpha/loader.lua"]["total_loads"], 1);
        assert!(value["scripts"]["alpha/loader.lua"]["unique_ips"].is_array());
        assert!(value["history"][0]["ip"].is_null());
        assert_eq!(value["history"][0]["script"], "alpha/loader.lua");
        assert!(value["history"][0]["timestamp"]
            .as_str()
            .unwrap()
            .starts_with("2023-11-14T"));
    }

    #[tokio::test]
    async fn test_store_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnalyticsStore::open(dir.path().join("analytics.json"))
            .await
            .unwrap();

        for _ in 0..3 {
            store
                .record_load("alpha/loader.lua", Some("1.1.1.1"))
                .await
                .unwrap();
        }
        store
            .record_load("beta/init.lua", Some("2.2.2.2"))
            .await
            .unwrap();

        let overview = store.overview().await;
        assert_eq!(overview.total_loads, 4);
        assert_eq!(overview.total_scripts, 2);
        let top: Vec<_> = overview
            .top_scripts
            .iter()
            .map(|t| (t.script.as_str(), t.total_loads, t.unique_ips))
            .collect();
        assert_eq!(
            top,
            vec![("alpha/loader.lua", 3, 1), ("beta/init.lua", 1, 1)]
        );
        assert_eq!(overview.recent_activity[0].script, "beta/init.lua");
    }

    #[tokio::test]
    async fn test_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("analytics.json");
        {
            let store = AnalyticsStore::open(&path).await.unwrap();
            store.record_load("a/x.lua", Some("1.1.1.1")).await.unwrap();
            store.record_load("a/x.lua", None).await.unwrap();
        }
        assert!(!path.with_extension("tmp").exists());

        let store = AnalyticsStore::open(&path).await.unwrap();
        let stats = store.script_stats("a/x.lua").await;
        assert_eq!(stats.total_loads, 2);
        assert_eq!(stats.last_ip.as_deref(), Some("1.1.1.1"));
        assert_eq!(store.overview().await.total_loads, 2);
    }

    #[tokio::test]
    async fn test_store_bootstrap_writes_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analytics.json");
        let store = AnalyticsStore::open(&path).await.unwrap();
        assert_eq!(store.file_path(), path.as_path());

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let doc: AnalyticsDocument = serde_json::from_str(&content).unwrap();
        assert_eq!(doc, AnalyticsDocument::default());
    }

    #[tokio::test]
    async fn test_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analytics.json");
        tokio::fs::write(&path, "{\"total_loads\": 3, \"scripts\": ")
            .await
            .unwrap();
        assert!(matches!(
            AnalyticsStore::open(&path).await,
            Err(AppError::Corrupt(_))
        ));
        // left untouched for inspection
        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(content.starts_with("{\"total_loads\": 3"));
    }

    #[tokio::test]
    async fn test_store_trims_oversized_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analytics.json");
        let mut doc = AnalyticsDocument::default();
        for i in 0..1200 {
            doc.history.push_back(LoadEvent {
                timestamp: at(i),
                script: "a/x.lua".into(),
                ip: None,
            });
        }
        doc.total_loads = 1200;
        tokio::fs::write(&path, serde_json::to_string(&doc).unwrap())
            .await
            .unwrap();

        let store = AnalyticsStore::open(&path).await.unwrap();
        let loaded = store.document.lock().await;
        assert_eq!(loaded.history.len(), MAX_HISTORY);
        assert_eq!(loaded.history.front().unwrap().timestamp, at(200));
        assert_eq!(loaded.total_loads, 1200);
    }

    #[tokio::test]
    async fn test_reset_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analytics.json");
        let store = AnalyticsStore::open(&path).await.unwrap();
        store.record_load("a/x.lua", Some("1.1.1.1")).await.unwrap();

        store.reset().await.unwrap();
        store.reset().await.unwrap();

        let overview = store.overview().await;
        assert_eq!(overview.total_loads, 0);
        assert_eq!(overview.total_scripts, 0);
        assert!(overview.top_scripts.is_empty());
        assert!(overview.recent_activity.is_empty());

        let reopened = AnalyticsStore::open(&path).await.unwrap();
        assert_eq!(reopened.overview().await.total_loads, 0);
    }

    #[tokio::test]
    async fn test_concurrent_loads_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(
            AnalyticsStore::open(dir.path().join("analytics.json"))
                .await
                .unwrap(),
        );

        let mut handles = Vec::new();
        for i in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let identity = if i % 2 == 0 { "a/even.lua" } else { "a/odd.lua" };
                store.record_load(identity, None).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.overview().await.total_loads, 20);
        assert_eq!(store.script_stats("a/even.lua").await.total_loads, 10);
        assert_eq!(store.script_stats("a/odd.lua").await.total_loads, 10);
    }
}
