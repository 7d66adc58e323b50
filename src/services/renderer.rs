// src/services/renderer.rs
use std::sync::Arc;

use crate::config::Config;
use crate::error::ServiceError;
use crate::image::{ImageData, ImageFormat};
use crate::prompts;
use crate::services::preferences;
use crate::services::providers::ImageEditor;
use crate::services::retry::RetryPolicy;
use crate::services::session_manager::Session;

/// Input of one image edit. Built fresh for every call, never stored.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub source_image: ImageData,
    pub instruction: String,
    pub preserve_constraints: String,
}

impl RenderRequest {
    /// Request for the session's next rendering, sourced from its most
    /// recent image. `None` until a photo has been uploaded.
    pub fn for_session(session: &Session) -> Option<Self> {
        let source_image = session.latest_image()?.clone();
        Some(Self {
            source_image,
            instruction: preferences::instruction_for(session),
            preserve_constraints: prompts::preservation_constraint(),
        })
    }
}

#[derive(Debug, Clone)]
#[must_use = "a rendering should be shown to the user"]
pub struct GeneratedImage {
    pub image: ImageData,
    pub model: String,
    pub duration_ms: u64,
}

pub type RenderResult = Result<GeneratedImage, ServiceError>;

pub struct RenderRequester {
    editor: Arc<dyn ImageEditor>,
    policy: RetryPolicy,
    max_image_bytes: usize,
}

impl RenderRequester {
    pub fn new(editor: Arc<dyn ImageEditor>, config: &Config) -> Self {
        Self {
            editor,
            policy: RetryPolicy::from_config(config),
            max_image_bytes: config.max_image_bytes,
        }
    }

    /// Sends the source image, instruction and preservation constraint to
    /// the image service.
    pub async fn render(&self, request: &RenderRequest) -> RenderResult {
        self.validate(&request.source_image)
            .map_err(|e| ServiceError::InvalidImage(format!("source image: {e}")))?;
        let rendered = self
            .policy
            .run("render", move || async move {
                let rendered = self.editor.edit(request).await?;
                // The result becomes the source of the next edit.
                self.validate(&rendered.image).map_err(|e| {
                    ServiceError::UpstreamUnavailable(format!("unusable rendering: {e}"))
                })?;
                Ok::<_, ServiceError>(rendered)
            })
            .await?;
        tracing::info!(
            model = %rendered.model,
            duration_ms = rendered.duration_ms,
            bytes = rendered.image.len(),
            "rendering received"
        );
        Ok(rendered)
    }

    fn validate(&self, image: &ImageData) -> Result<(), String> {
        if image.is_empty() {
            return Err("image is empty".into());
        }
        if image.len() > self.max_image_bytes {
            return Err(format!(
                "image is {} bytes, limit is {}",
                image.len(),
                self.max_image_bytes
            ));
        }
        if ImageFormat::from_magic_bytes(image.bytes()) != Some(image.format()) {
            return Err("image does not match its format".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::fixtures::{jpeg, png};
    use crate::services::session_manager::Turn;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    struct ScriptedEditor {
        outcomes: Mutex<Vec<RenderResult>>,
        sources: Mutex<Vec<ImageData>>,
    }

    impl ScriptedEditor {
        fn new(outcomes: Vec<RenderResult>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes),
                sources: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.sources.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ImageEditor for ScriptedEditor {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn edit(&self, request: &RenderRequest) -> RenderResult {
            self.sources.lock().unwrap().push(request.source_image.clone());
            self.outcomes.lock().unwrap().remove(0)
        }
    }

    fn rendered(tag: u8) -> RenderResult {
        Ok(GeneratedImage {
            image: ImageData::generated(jpeg(tag), None, usize::MAX).unwrap(),
            model: "scripted".into(),
            duration_ms: 1,
        })
    }

    fn requester(editor: Arc<ScriptedEditor>) -> RenderRequester {
        let mut config = Config::new("c", "i");
        config.retry_backoff = Duration::ZERO;
        config.max_image_bytes = 64;
        RenderRequester::new(editor, &config)
    }

    fn request(bytes: Vec<u8>) -> RenderRequest {
        RenderRequest {
            source_image: ImageData::generated(bytes, None, usize::MAX).unwrap(),
            instruction: "add a lawn".into(),
            preserve_constraints: prompts::preservation_constraint(),
        }
    }

    #[tokio::test]
    async fn upstream_failure_retried_once() {
        let editor = ScriptedEditor::new(vec![
            Err(ServiceError::UpstreamUnavailable("503".into())),
            rendered(9),
        ]);
        let result = requester(editor.clone()).render(&request(png(1))).await;
        assert_eq!(result.unwrap().image.bytes(), jpeg(9).as_slice());
        assert_eq!(editor.calls(), 2);
    }

    #[tokio::test]
    async fn quota_is_not_retried() {
        let editor = ScriptedEditor::new(vec![
            Err(ServiceError::QuotaExceeded("429".into())),
            rendered(9),
        ]);
        let err = requester(editor.clone())
            .render(&request(png(1)))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "quota_exceeded");
        assert_eq!(editor.calls(), 1);
    }

    #[tokio::test]
    async fn invalid_source_never_reaches_the_service() {
        let editor = ScriptedEditor::new(vec![rendered(9)]);
        let requester = requester(editor.clone());

        let oversized = request([png(1), vec![0; 100]].concat());
        assert_eq!(
            requester.render(&oversized).await.unwrap_err().code(),
            "invalid_image"
        );
        assert_eq!(editor.calls(), 0);
    }

    #[tokio::test]
    async fn oversized_rendering_is_never_returned() {
        let oversized = || {
            Ok(GeneratedImage {
                image: ImageData::generated([jpeg(3), vec![0; 100]].concat(), None, usize::MAX)
                    .unwrap(),
                model: "scripted".into(),
                duration_ms: 1,
            })
        };
        let editor = ScriptedEditor::new(vec![oversized(), oversized()]);
        let err = requester(editor.clone())
            .render(&request(png(1)))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "upstream_unavailable");
        assert_eq!(editor.calls(), 2);

        let editor = ScriptedEditor::new(vec![oversized(), rendered(4)]);
        let result = requester(editor.clone()).render(&request(png(1))).await;
        assert_eq!(result.unwrap().image.bytes(), jpeg(4).as_slice());
    }

    #[test]
    fn request_uses_latest_image() {
        let mut session = Session::new("s");
        assert!(RenderRequest::for_session(&session).is_none());

        let upload = ImageData::from_bytes(png(1), 1024).unwrap();
        let first = ImageData::generated(jpeg(2), None, 1024).unwrap();
        session.push_turn(Turn::user(None, Some(upload.clone())));
        session.push_turn(Turn::user(Some("tropical with a pool".into()), None));
        assert_eq!(RenderRequest::for_session(&session).unwrap().source_image, upload);

        session.push_turn(Turn::rendering("done", first.clone()));
        session.push_turn(Turn::user(Some("more palms".into()), None));
        let next = RenderRequest::for_session(&session).unwrap();
        assert_eq!(next.source_image, first);
        assert!(next.instruction.contains("more palms"));
        assert!(next.preserve_constraints.contains("roof"));
    }
}
