//! Rule sink publishing installed rules to a JSON file

use async_trait::async_trait;
use lockin_api::{BlockRule, RuleId};
use lockin_host_api::{HostError, HostResult, RuleSink};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Rule sink backed by a JSON array on disk
///
/// The file always holds the complete installed rule set. Updates write a
/// temporary file next to it and rename it into place, so readers never
/// observe a half-written set.
pub struct RuleFile {
    path: PathBuf,
    rules: Mutex<Vec<BlockRule>>,
    last_write_ok: AtomicBool,
}

impl RuleFile {
    /// Open the sink, loading any previously published rules
    pub fn open(path: impl Into<PathBuf>) -> HostResult<Self> {
        let path = path.into();

        let rules = if path.exists() {
            let content = std::fs::read(&path)?;
            match serde_json::from_slice::<Vec<BlockRule>>(&content) {
                Ok(rules) => rules,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Ignoring unreadable rule file");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        debug!(path = %path.display(), rules = rules.len(), "Rule file opened");

        Ok(Self {
            path,
            rules: Mutex::new(rules),
            last_write_ok: AtomicBool::new(true),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, rules: &[BlockRule]) -> HostResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_vec_pretty(rules)
            .map_err(|e| HostError::RuleUpdateFailed(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[async_trait]
impl RuleSink for RuleFile {
    async fn update_rules(
        &self,
        remove_ids: &[RuleId],
        add_rules: Vec<BlockRule>,
    ) -> HostResult<()> {
        let mut rules = self
            .rules
            .lock()
            .map_err(|_| HostError::Internal("rule lock poisoned".into()))?;

        let mut next: Vec<BlockRule> = rules
            .iter()
            .filter(|r| !remove_ids.contains(&r.id))
            .cloned()
            .collect();
        for rule in add_rules {
            next.retain(|r| r.id != rule.id);
            next.push(rule);
        }

        if let Err(e) = self.write(&next) {
            self.last_write_ok.store(false, Ordering::Relaxed);
            warn!(path = %self.path.display(), error = %e, "Failed to publish rules");
            return Err(HostError::RuleUpdateFailed(e.to_string()));
        }

        self.last_write_ok.store(true, Ordering::Relaxed);
        info!(
            removed = remove_ids.len(),
            installed = next.len(),
            "Rules published"
        );
        *rules = next;
        Ok(())
    }

    async fn installed_rules(&self) -> HostResult<Vec<BlockRule>> {
        self.rules
            .lock()
            .map(|r| r.clone())
            .map_err(|_| HostError::Internal("rule lock poisoned".into()))
    }

    fn is_healthy(&self) -> bool {
        self.last_write_ok.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockin_api::{
        ResourceType, RuleAction, RuleActionType, RuleCondition, LOCKDOWN_RULE_ID,
        LOCKDOWN_RULE_PRIORITY,
    };

    fn rule(allowed: &[&str]) -> BlockRule {
        BlockRule {
            id: LOCKDOWN_RULE_ID,
            priority: LOCKDOWN_RULE_PRIORITY,
            action: RuleAction {
                kind: RuleActionType::Block,
            },
            condition: RuleCondition {
                url_filter: "*".into(),
                excluded_initiator_domains: Some(allowed.iter().map(|s| s.to_string()).collect()),
                resource_types: vec![ResourceType::MainFrame],
            },
        }
    }

    #[tokio::test]
    async fn test_install_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        let sink = RuleFile::open(&path).unwrap();

        sink.update_rules(&[LOCKDOWN_RULE_ID], vec![rule(&["github.com"])])
            .await
            .unwrap();

        let on_disk: Vec<BlockRule> =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(on_disk, vec![rule(&["github.com"])]);

        sink.update_rules(&[LOCKDOWN_RULE_ID], vec![]).await.unwrap();
        assert!(sink.installed_rules().await.unwrap().is_empty());

        let on_disk: Vec<BlockRule> =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert!(on_disk.is_empty());
    }

    #[tokio::test]
    async fn test_same_id_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let sink = RuleFile::open(dir.path().join("rules.json")).unwrap();

        sink.update_rules(&[], vec![rule(&["a.example"])]).await.unwrap();
        sink.update_rules(&[], vec![rule(&["b.example"])]).await.unwrap();

        let installed = sink.installed_rules().await.unwrap();
        assert_eq!(installed, vec![rule(&["b.example"])]);
    }

    #[tokio::test]
    async fn test_reopen_loads_published_rules() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("rules.json");

        {
            let sink = RuleFile::open(&path).unwrap();
            sink.update_rules(&[LOCKDOWN_RULE_ID], vec![rule(&["notion.so"])])
                .await
                .unwrap();
        }

        let sink = RuleFile::open(&path).unwrap();
        assert_eq!(sink.path(), path.as_path());
        assert_eq!(sink.installed_rules().await.unwrap(), vec![rule(&["notion.so"])]);
    }

    #[tokio::test]
    async fn test_unwritable_path_fails_whole_update() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();

        let sink = RuleFile::open(blocker.join("rules.json")).unwrap();
        let result = sink
            .update_rules(&[LOCKDOWN_RULE_ID], vec![rule(&["github.com"])])
            .await;

        assert!(matches!(result, Err(HostError::RuleUpdateFailed(_))));
        assert!(sink.installed_rules().await.unwrap().is_empty());
        assert!(!sink.is_healthy());
    }
}
