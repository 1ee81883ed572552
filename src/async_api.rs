use crate::controller::{Navigation, SubmitAction};
use crate::page::{wire, Page};
use crate::rendering::PaintCommand;
use crate::surface::PointerEvent;
use crate::template::{PageTemplate, Trigger};
use crate::transport::Transport;
use crate::{Error, PageConfig, Result};
use serde_json::Value;
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;
use tokio::sync::oneshot;

type Reply<T> = oneshot::Sender<Result<T>>;

enum Command {
    PointerDown(Reply<()>),
    PointerUp(Reply<()>),
    PointerMove(PointerEvent, Reply<Option<PaintCommand>>),
    TypeText(String, Reply<()>),
    Click(String, Sender<Command>, Reply<Option<Navigation>>),
    Complete(SubmitAction, Result<Value>, Reply<Option<Navigation>>),
    Brightness(Reply<Vec<f64>>),
    Png(Reply<Vec<u8>>),
    Status(oneshot::Sender<Option<String>>),
    Location(oneshot::Sender<Option<Navigation>>),
    Close(Reply<()>),
}

/// An async-friendly page backed by a dedicated event thread.
///
/// The event thread owns the `Page` and handles one command at a time, the
/// way a browser's UI thread handles DOM events. Submissions are the
/// exception: the request is built on the event thread, sent from a helper
/// thread, and its outcome is posted back to the event thread as a
/// completion, so pointer events keep flowing while a response is pending.
#[derive(Clone)]
pub struct PageSession {
    cmd_tx: Sender<Command>,
}

impl PageSession {
    /// Wire `template` on a new event thread.
    pub async fn new(
        template: PageTemplate,
        config: PageConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        Self::spawn(move || wire(template, config, transport)).await
    }

    /// Load the template from `config.base_url` and wire it on a new event thread.
    #[cfg(all(feature = "http", feature = "template"))]
    pub async fn connect(config: PageConfig) -> Result<Self> {
        Self::spawn(move || {
            let transport = crate::transport::HttpTransport::new(&config)?;
            Page::load(config, Arc::new(transport))
        })
        .await
    }

    async fn spawn<F>(init: F) -> Result<Self>
    where
        F: FnOnce() -> Result<Page> + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx): (Reply<()>, oneshot::Receiver<Result<()>>) = oneshot::channel();

        thread::spawn(move || {
            // Page (and its transport) live and die on the event thread
            let mut page = match init() {
                Ok(p) => p,
                Err(err) => {
                    let _ = init_tx.send(Err(err));
                    return;
                }
            };
            let _ = init_tx.send(Ok(()));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::PointerDown(resp) => {
                        let _ = resp.send(page.pointer_down());
                    }
                    Command::PointerUp(resp) => {
                        let _ = resp.send(page.pointer_up());
                    }
                    Command::PointerMove(ev, resp) => {
                        let _ = resp.send(page.pointer_move(&ev));
                    }
                    Command::TypeText(text, resp) => {
                        let _ = resp.send(page.type_text(&text));
                    }
                    Command::Click(id, self_tx, resp) => dispatch_click(&mut page, &id, self_tx, resp),
                    Command::Complete(action, outcome, resp) => {
                        let res = page.finish(action, outcome).map(Some);
                        let _ = resp.send(res);
                    }
                    Command::Brightness(resp) => {
                        let res = page
                            .surface()
                            .map(|s| crate::encoder::BrightnessEncoder::encode(s.canvas()).to_vec())
                            .ok_or_else(|| Error::TemplateError("template has no canvas".into()));
                        let _ = resp.send(res);
                    }
                    Command::Png(resp) => {
                        let res = page
                            .surface()
                            .ok_or_else(|| Error::TemplateError("template has no canvas".into()))
                            .and_then(|s| s.canvas().to_png());
                        let _ = resp.send(res);
                    }
                    Command::Status(resp) => {
                        let _ = resp.send(page.status().map(str::to_string));
                    }
                    Command::Location(resp) => {
                        let _ = resp.send(page.location().cloned());
                    }
                    Command::Close(resp) => {
                        let _ = resp.send(Ok(()));
                        break;
                    }
                }
            }
        });

        let init_res = init_rx
            .await
            .map_err(|e| Error::Other(format!("Page init canceled: {}", e)))?;
        init_res?;

        Ok(Self { cmd_tx })
    }

    pub async fn pointer_down(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::PointerDown(tx))?;
        rx.await
            .map_err(|e| Error::Other(format!("PointerDown canceled: {}", e)))?
    }

    pub async fn pointer_up(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::PointerUp(tx))?;
        rx.await
            .map_err(|e| Error::Other(format!("PointerUp canceled: {}", e)))?
    }

    pub async fn pointer_move(&self, ev: PointerEvent) -> Result<Option<PaintCommand>> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::PointerMove(ev, tx))?;
        rx.await
            .map_err(|e| Error::Other(format!("PointerMove canceled: {}", e)))?
    }

    pub async fn type_text(&self, text: &str) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::TypeText(text.to_string(), tx))?;
        rx.await
            .map_err(|e| Error::Other(format!("TypeText canceled: {}", e)))?
    }

    /// Click the element with `id`; resolves once any submission it started settles.
    pub async fn click(&self, id: &str) -> Result<Option<Navigation>> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Click(id.to_string(), self.cmd_tx.clone(), tx))?;
        rx.await
            .map_err(|e| Error::Other(format!("Click canceled: {}", e)))?
    }

    /// Current brightness vector of the canvas.
    pub async fn brightness(&self) -> Result<Vec<f64>> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Brightness(tx))?;
        rx.await
            .map_err(|e| Error::Other(format!("Brightness canceled: {}", e)))?
    }

    /// PNG snapshot of the canvas; if `path` is Some, the bytes are also saved there.
    pub async fn screenshot(&self, path: Option<&str>) -> Result<Vec<u8>> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Png(tx))?;
        let png = rx
            .await
            .map_err(|e| Error::Other(format!("Screenshot canceled: {}", e)))??;
        if let Some(path) = path {
            std::fs::write(path, &png)
                .map_err(|e| Error::Other(format!("Failed to write {}: {}", path, e)))?;
        }
        Ok(png)
    }

    pub async fn status(&self) -> Result<Option<String>> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Status(tx))?;
        rx.await
            .map_err(|e| Error::Other(format!("Status canceled: {}", e)))
    }

    pub async fn location(&self) -> Result<Option<Navigation>> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Location(tx))?;
        rx.await
            .map_err(|e| Error::Other(format!("Location canceled: {}", e)))
    }

    /// Shut down the event thread.
    pub async fn close(self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Close(tx))?;
        rx.await
            .map_err(|e| Error::Other(format!("Close canceled: {}", e)))?
    }

    fn send(&self, cmd: Command) -> Result<()> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| Error::Other("page event thread has stopped".into()))
    }
}

fn dispatch_click(page: &mut Page, id: &str, self_tx: Sender<Command>, resp: Reply<Option<Navigation>>) {
    let trigger = match page.trigger_for(id) {
        Ok(t) => t,
        Err(e) => {
            let _ = resp.send(Err(e));
            return;
        }
    };

    if trigger == Trigger::Clear {
        let _ = resp.send(page.click(id));
        return;
    }

    let pending = match page.begin(trigger) {
        Ok(p) => p,
        Err(e) => {
            let _ = resp.send(Err(e));
            return;
        }
    };

    let transport = page.transport();
    thread::spawn(move || {
        let outcome = transport.post_form(&pending.request);
        if let Err(mpsc::SendError(Command::Complete(_, _, resp))) =
            self_tx.send(Command::Complete(pending.action, outcome, resp))
        {
            let _ = resp.send(Err(Error::Other("page closed before the response arrived".into())));
        }
    });
}
