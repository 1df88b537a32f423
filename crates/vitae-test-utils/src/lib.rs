//! Testing utilities for the Vitae workspace
//!
//! Résumé fixtures, a storage backend that fails on demand and a remote
//! store whose answers can be scripted and held back.

#![allow(missing_docs)]

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::Semaphore;
use vitae_core::{EditorController, NetworkError, RemoteStore, SaveOutcome};
use vitae_form::FormSynthesizer;
use vitae_store::{
    LocalStore, Locale, MemoryBackend, PersistenceError, ReconciliationEngine, StorageBackend,
};

pub fn locale(code: &str) -> Locale {
    Locale::new(code).unwrap()
}

/// Portuguese résumé with every kind of section content
pub fn resume_pt() -> Value {
    json!({
        "languageName": "Português",
        "name": "Ana Lima",
        "email": "ana@example.com",
        "phone": "+55 21 99999-0000",
        "linkedin": "https://linkedin.com/in/ana",
        "available": true,
        "secoes": {
            "experiencia": {
                "titulo": "Experiência Profissional",
                "empregos": [
                    {
                        "empresa": "Acme",
                        "cargo": "Engenheira",
                        "periodo": "2020 - 2023",
                        "atividades": "Serviços de pagamento",
                        "tags": ["rust", "kafka"]
                    }
                ]
            },
            "habilidades": {
                "titulo": "Habilidades",
                "itens": ["Rust", "SQL", "Kubernetes"]
            },
            "formacao": {
                "titulo": "Formação",
                "graduacao": {
                    "curso": "Ciência da Computação",
                    "instituicao": "UFRJ",
                    "cursos": []
                }
            }
        }
    })
}

/// English résumé with empty lists that take their shape from aliases
pub fn resume_en() -> Value {
    json!({
        "languageName": "English",
        "name": "Ana Lima",
        "email": "ana@example.com",
        "sections": {
            "experience": {"title": "Experience", "jobs": []},
            "education": {"title": "Education", "degrees": []},
            "languages": {"title": "Languages", "list": []}
        }
    })
}

/// Controller over a fresh in-memory store
pub fn controller() -> EditorController {
    controller_with(LocalStore::in_memory())
}

pub fn controller_with(store: LocalStore) -> EditorController {
    EditorController::new(FormSynthesizer::default(), store, ReconciliationEngine::default())
}

/// Memory backend that refuses writes to chosen keys
#[derive(Debug, Default)]
pub struct FailingBackend {
    inner: MemoryBackend,
    failing: Mutex<Vec<String>>,
    fail_all: Mutex<bool>,
}

impl FailingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(&self, key: &str) {
        self.failing.lock().push(key.to_string());
    }

    pub fn fail_all(&self, enabled: bool) {
        *self.fail_all.lock() = enabled;
    }

    pub fn heal(&self) {
        self.failing.lock().clear();
        *self.fail_all.lock() = false;
    }
}

impl StorageBackend for FailingBackend {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        if *self.fail_all.lock() || self.failing.lock().iter().any(|k| k == key) {
            return Err(PersistenceError::QuotaExceeded {
                key: key.to_string(),
                needed: key.len() + value.len(),
                available: 0,
            });
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        self.inner.remove(key)
    }

    fn keys(&self) -> Result<Vec<String>, PersistenceError> {
        self.inner.keys()
    }
}

/// Remote store with scripted answers
///
/// Fetches for a held locale wait until [`release`](Self::release) is
/// called, which makes stale-response orderings deterministic.
#[derive(Debug, Default)]
pub struct ScriptedRemote {
    documents: Mutex<BTreeMap<String, Value>>,
    save_outcomes: Mutex<VecDeque<Result<SaveOutcome, NetworkError>>>,
    fetch_failures: Mutex<VecDeque<NetworkError>>,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, locale: &Locale, document: Value) -> Self {
        self.documents.lock().insert(locale.to_string(), document);
        self
    }

    pub fn document(&self, locale: &Locale) -> Option<Value> {
        self.documents.lock().get(locale.as_str()).cloned()
    }

    /// Answer the next save with `outcome` instead of storing
    pub fn script_save(&self, outcome: Result<SaveOutcome, NetworkError>) {
        self.save_outcomes.lock().push_back(outcome);
    }

    /// Fail the next fetch
    pub fn fail_next_fetch(&self, err: NetworkError) {
        self.fetch_failures.lock().push_back(err);
    }

    pub fn hold(&self, locale: &Locale) {
        self.gates
            .lock()
            .insert(locale.to_string(), Arc::new(Semaphore::new(0)));
    }

    pub fn release(&self, locale: &Locale) {
        if let Some(gate) = self.gates.lock().remove(locale.as_str()) {
            gate.add_permits(1);
        }
    }

    /// Calls seen so far, as `fetch:<locale>` / `save:<locale>`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait::async_trait]
impl RemoteStore for ScriptedRemote {
    async fn fetch(&self, locale: &Locale) -> Result<Option<Value>, NetworkError> {
        self.calls.lock().push(format!("fetch:{locale}"));
        let gate = self.gates.lock().get(locale.as_str()).cloned();
        if let Some(gate) = gate {
            let _permit = gate
                .acquire()
                .await
                .map_err(|e| NetworkError::Unreachable(e.to_string()))?;
        }
        if let Some(err) = self.fetch_failures.lock().pop_front() {
            return Err(err);
        }
        Ok(self.document(locale))
    }

    async fn save(&self, locale: &Locale, document: &Value) -> Result<SaveOutcome, NetworkError> {
        self.calls.lock().push(format!("save:{locale}"));
        if let Some(outcome) = self.save_outcomes.lock().pop_front() {
            return outcome;
        }
        self.documents.lock().insert(locale.to_string(), document.clone());
        Ok(SaveOutcome::accepted("Arquivo salvo com sucesso!"))
    }

    async fn fetch_schema(&self, locale: &Locale) -> Result<Option<Value>, NetworkError> {
        self.calls.lock().push(format!("schema:{locale}"));
        Ok(Some(json!({"$schema": "http://json-schema.org/draft-07/schema#", "type": "object"})))
    }
}
