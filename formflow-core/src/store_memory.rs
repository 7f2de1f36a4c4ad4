//! In-memory `FlowStore` backend.
//!
//! One tokio mutex over all tables keeps the `commit_*` read-modify-write
//! methods genuinely atomic, matching what a SQL backend gets from a
//! transaction. Used by tests and the single-process deployment path.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::events::FlowEvent;
use crate::store::FlowStore;
use crate::types::{AccessLink, FormInstance, Signatory, Template};

#[derive(Default)]
struct Inner {
    templates: BTreeMap<Uuid, Template>,
    instances: BTreeMap<Uuid, FormInstance>,
    signatories: BTreeMap<Uuid, Signatory>,
    links: BTreeMap<String, AccessLink>,
    events: BTreeMap<Uuid, Vec<FlowEvent>>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn cas_write(inner: &mut Inner, instance: &FormInstance, expected_version: u64) -> bool {
    let current = inner
        .instances
        .get(&instance.instance_id)
        .map(|i| i.version);
    if current != Some(expected_version) {
        return false;
    }
    let mut next = instance.clone();
    next.version = expected_version + 1;
    inner.instances.insert(next.instance_id, next);
    true
}

#[async_trait]
impl FlowStore for MemoryStore {
    async fn save_template(&self, template: &Template) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.templates.insert(template.template_id, template.clone());
        Ok(())
    }

    async fn load_template(&self, template_id: Uuid) -> Result<Option<Template>> {
        Ok(self.inner.lock().await.templates.get(&template_id).cloned())
    }

    async fn insert_instance(&self, instance: &FormInstance) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.instances.insert(instance.instance_id, instance.clone());
        Ok(())
    }

    async fn load_instance(&self, instance_id: Uuid) -> Result<Option<FormInstance>> {
        Ok(self.inner.lock().await.instances.get(&instance_id).cloned())
    }

    async fn update_instance(
        &self,
        instance: &FormInstance,
        expected_version: u64,
    ) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        Ok(cas_write(&mut inner, instance, expected_version))
    }

    async fn commit_signature(
        &self,
        instance: &FormInstance,
        expected_version: u64,
        signatory: &Signatory,
    ) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        if !cas_write(&mut inner, instance, expected_version) {
            return Ok(false);
        }
        inner
            .signatories
            .insert(signatory.signatory_id, signatory.clone());
        Ok(true)
    }

    async fn commit_unlock(
        &self,
        instance: &FormInstance,
        expected_version: u64,
    ) -> Result<Option<usize>> {
        let mut inner = self.inner.lock().await;
        if !cas_write(&mut inner, instance, expected_version) {
            return Ok(None);
        }
        let mut cleared = 0;
        for signatory in inner
            .signatories
            .values_mut()
            .filter(|s| s.instance_id == instance.instance_id)
        {
            if signatory.signed_at.is_some() {
                cleared += 1;
            }
            signatory.signed_at = None;
            signatory.signature_data = None;
        }
        Ok(Some(cleared))
    }

    async fn insert_signatory(&self, signatory: &Signatory) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner
            .signatories
            .insert(signatory.signatory_id, signatory.clone());
        Ok(())
    }

    async fn load_signatory(&self, signatory_id: Uuid) -> Result<Option<Signatory>> {
        Ok(self
            .inner
            .lock()
            .await
            .signatories
            .get(&signatory_id)
            .cloned())
    }

    async fn load_signatories(&self, instance_id: Uuid) -> Result<Vec<Signatory>> {
        Ok(self
            .inner
            .lock()
            .await
            .signatories
            .values()
            .filter(|s| s.instance_id == instance_id)
            .cloned()
            .collect())
    }

    async fn save_link(&self, link: &AccessLink) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.links.insert(link.token.clone(), link.clone());
        Ok(())
    }

    async fn load_link(&self, token: &str) -> Result<Option<AccessLink>> {
        Ok(self.inner.lock().await.links.get(token).cloned())
    }

    async fn append_event(&self, instance_id: Uuid, event: &FlowEvent) -> Result<u64> {
        let mut inner = self.inner.lock().await;
        let log = inner.events.entry(instance_id).or_default();
        log.push(event.clone());
        Ok(log.len() as u64)
    }

    async fn read_events(&self, instance_id: Uuid) -> Result<Vec<(u64, FlowEvent)>> {
        Ok(self
            .inner
            .lock()
            .await
            .events
            .get(&instance_id)
            .map(|log| {
                log.iter()
                    .enumerate()
                    .map(|(i, e)| (i as u64 + 1, e.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }
}
