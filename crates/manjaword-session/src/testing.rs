//! Test doubles shared by the unit tests of this crate.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use manjaword_core::{
    CommandGateway, CommandName, CommandRequest, CommandResponse, GatewayError, GrammarResponse,
};
use tokio::sync::oneshot;

type Reply = Result<CommandResponse, GatewayError>;

enum Scripted {
    Ready(Reply),
    Deferred(oneshot::Receiver<Reply>),
}

/// Gateway recording every request and answering from a per-command script.
///
/// Commands without a scripted reply get a neutral default: nothing to recover,
/// canceled open, a fixed written path, no grammar matches.
#[derive(Default)]
pub struct FakeGateway {
    requests: Mutex<Vec<CommandRequest>>,
    scripts: Mutex<HashMap<CommandName, VecDeque<Scripted>>>,
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue the reply to the next call of `name`.
    pub fn respond(&self, name: CommandName, reply: Reply) {
        self.scripts
            .lock()
            .unwrap()
            .entry(name)
            .or_default()
            .push_back(Scripted::Ready(reply));
    }

    /// Queue a reply to the next call of `name` that is only delivered through the
    /// returned sender. Dropping the sender fails the call with a transport error.
    pub fn defer(&self, name: CommandName) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.scripts
            .lock()
            .unwrap()
            .entry(name)
            .or_default()
            .push_back(Scripted::Deferred(rx));
        tx
    }

    pub fn requests(&self) -> Vec<CommandRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self, name: CommandName) -> Vec<CommandRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.name() == name)
            .collect()
    }

    fn default_reply(name: CommandName) -> Reply {
        Ok(match name {
            CommandName::AutosaveDocument => CommandResponse::Done,
            CommandName::RecoverUnsavedDocument => CommandResponse::Recovered(None),
            CommandName::OpenFile => CommandResponse::Opened(None),
            CommandName::SaveFile => {
                CommandResponse::Written(Some("/tmp/untitled.manjaword.json".to_string()))
            }
            CommandName::ExportDocx => CommandResponse::Written(Some("/tmp/document.docx".to_string())),
            CommandName::ExportPdf => CommandResponse::Written(Some("/tmp/document.pdf".to_string())),
            CommandName::GrammarCheck => CommandResponse::Grammar(GrammarResponse::default()),
        })
    }
}

#[async_trait]
impl CommandGateway for FakeGateway {
    fn backend_name(&self) -> &'static str {
        "fake"
    }

    async fn invoke(&self, request: CommandRequest) -> Result<CommandResponse, GatewayError> {
        let name = request.name();
        self.requests.lock().unwrap().push(request);

        let scripted = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&name)
            .and_then(|queue| queue.pop_front());

        match scripted {
            Some(Scripted::Ready(reply)) => reply,
            Some(Scripted::Deferred(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(GatewayError::Transport("reply dropped".to_string()))),
            None => Self::default_reply(name),
        }
    }
}

/// Let spawned tasks (adapter, autosave) run until they block again.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
