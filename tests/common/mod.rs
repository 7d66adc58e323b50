#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use garden_design_backend::config::Config;
use garden_design_backend::error::ServiceError;
use garden_design_backend::image::ImageData;
use garden_design_backend::services::providers::{ChatModel, ChatPrompt, ImageEditor};
use garden_design_backend::services::renderer::{GeneratedImage, RenderRequest};
use garden_design_backend::state::AppState;

pub fn png(tag: u8) -> Vec<u8> {
    vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, tag]
}

pub fn jpeg(tag: u8) -> Vec<u8> {
    vec![0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, tag]
}

pub fn test_config() -> Config {
    let mut config = Config::new("test-chat-key", "test-image-key");
    config.retry_backoff = Duration::ZERO;
    config.request_timeout = Duration::from_millis(200);
    config
}

/// Chat model that replies from a script, then with "Noted.".
#[derive(Default)]
pub struct FakeChat {
    script: Mutex<VecDeque<Result<String, ServiceError>>>,
    pub prompts: Mutex<Vec<ChatPrompt>>,
    delay: Option<Duration>,
}

impl FakeChat {
    pub fn replying() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_script(script: Vec<Result<String, ServiceError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        })
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatModel for FakeChat {
    fn name(&self) -> &str {
        "fake-chat"
    }

    async fn complete(&self, prompt: &ChatPrompt) -> Result<String, ServiceError> {
        self.prompts.lock().unwrap().push(prompt.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok("Noted.".to_string()))
    }
}

/// Image editor that returns JPEGs tagged 1, 2, 3... unless scripted otherwise.
#[derive(Default)]
pub struct FakeEditor {
    script: Mutex<VecDeque<Result<(), ServiceError>>>,
    pub requests: Mutex<Vec<RenderRequest>>,
    padding: usize,
}

impl FakeEditor {
    pub fn succeeding() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_with(err: ServiceError) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::from(vec![Err(err)])),
            ..Self::default()
        })
    }

    /// Editor whose renderings carry `padding` extra bytes.
    pub fn padded(padding: usize) -> Arc<Self> {
        Arc::new(Self {
            padding,
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn source_of_call(&self, index: usize) -> Vec<u8> {
        self.requests.lock().unwrap()[index]
            .source_image
            .bytes()
            .to_vec()
    }
}

#[async_trait]
impl ImageEditor for FakeEditor {
    fn name(&self) -> &str {
        "fake-editor"
    }

    async fn edit(&self, request: &RenderRequest) -> Result<GeneratedImage, ServiceError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len() as u8
        };
        let scripted = self.script.lock().unwrap().pop_front();
        if let Some(Err(e)) = scripted {
            return Err(e);
        }
        let mut bytes = jpeg(call);
        bytes.resize(bytes.len() + self.padding, 0);
        Ok(GeneratedImage {
            image: ImageData::generated(bytes, None, usize::MAX)?,
            model: "fake-editor".into(),
            duration_ms: 0,
        })
    }
}

pub fn app_state(chat: Arc<FakeChat>, editor: Arc<FakeEditor>) -> Arc<AppState> {
    app_state_with(test_config(), chat, editor)
}

pub fn app_state_with(config: Config, chat: Arc<FakeChat>, editor: Arc<FakeEditor>) -> Arc<AppState> {
    Arc::new(AppState::new(&config, chat, editor))
}
