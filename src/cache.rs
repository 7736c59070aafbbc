//! Whole-page response cache.
//!
//! GET responses with status 200 are stored by request URL (path and
//! query) and replayed until they expire or the store is cleared. Clearing is
//! driven by [`crate::signals`] whenever answers change.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use actix_web::{
    Error, HttpResponse,
    web::{self, Bytes},
    body::{self, BoxBody, MessageBody},
    dev::{ServiceRequest, ServiceResponse},
    http::{Method, StatusCode, header},
    middleware::Next,
};

/// A stored response body with the headers needed to replay it.
#[derive(Debug, Clone)]
pub struct CachedPage {
    content_type: Option<String>,
    body: Bytes,
    stored_at: Instant,
}

impl CachedPage {
    pub fn new(content_type: Option<String>, body: Bytes) -> Self {
        Self { content_type, body, stored_at: Instant::now() }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() >= ttl
    }

    fn to_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::Ok();
        if let Some(ct) = &self.content_type {
            builder.insert_header((header::CONTENT_TYPE, ct.as_str()));
        }
        builder
            .insert_header(("X-Cache", "HIT"))
            .body(self.body.clone())
    }
}

#[derive(Debug)]
pub struct PageCache {
    entries: RwLock<HashMap<String, CachedPage>>,
    ttl: Duration,
    max_entries: usize,
}

impl PageCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            max_entries,
        }
    }

    /// Fresh entry for `key`, if any. Expired entries are dropped on access.
    pub fn get(&self, key: &str) -> Option<CachedPage> {
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            match entries.get(key) {
                Some(page) if !page.is_expired(self.ttl) => return Some(page.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        None
    }

    /// Store a page. When the store is full, expired entries are purged first;
    /// if it is still full the page is not stored.
    pub fn set(&self, key: String, page: CachedPage) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.len() >= self.max_entries && !entries.contains_key(&key) {
            let ttl = self.ttl;
            entries.retain(|_, p| !p.is_expired(ttl));
            if entries.len() >= self.max_entries {
                log::debug!("Page cache full ({} entries), not storing {key}", entries.len());
                return;
            }
        }
        entries.insert(key, page);
    }

    /// Drop every entry. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let n = entries.len();
        entries.clear();
        n
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Middleware serving and filling the [`PageCache`] registered as app data.
///
/// Requests other than GET, and apps without a cache, pass straight through.
/// The key is the URL alone, so only GET bodies may be stored under it.
pub async fn cache_page(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let cache = req.app_data::<web::Data<PageCache>>().cloned();
    let cacheable = *req.method() == Method::GET;

    let Some(cache) = cache.filter(|_| cacheable) else {
        return next.call(req).await.map(ServiceResponse::map_into_boxed_body);
    };

    let key = req.uri().to_string();
    if let Some(page) = cache.get(&key) {
        log::debug!("Page cache hit: {key}");
        return Ok(req.into_response(page.to_response()));
    }

    let res = next.call(req).await?;
    if res.status() != StatusCode::OK {
        return Ok(res.map_into_boxed_body());
    }

    let (req, res) = res.into_parts();
    let content_type = res
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let (res, body) = res.into_parts();
    let bytes = match body::to_bytes(body).await {
        Ok(bytes) => bytes,
        Err(e) => {
            let e: Box<dyn std::error::Error> = e.into();
            return Err(actix_web::error::ErrorInternalServerError(e.to_string()));
        }
    };

    cache.set(key, CachedPage::new(content_type, bytes.clone()));
    let res = res.set_body(bytes).map_into_boxed_body();
    Ok(ServiceResponse::new(req, res))
}
