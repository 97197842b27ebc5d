use serde::{Deserialize, Serialize};

use crux_core::capability::{Capability, CapabilityContext, Operation};

use crate::event::Event;

/// Scroll and focus requests for the transcript and composer. The shell
/// owns the DOM; the core decides when these happen.
#[derive(Clone)]
pub struct Viewport<E> {
    context: CapabilityContext<ViewportOperation, E>,
}

impl<Ev> Capability<Ev> for Viewport<Ev> {
    type Operation = ViewportOperation;
    type MappedSelf<MappedEv> = Viewport<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static,
    {
        Viewport::new(self.context.map_event(f))
    }
}

impl<E> Viewport<E>
where
    E: 'static,
{
    pub fn new(context: CapabilityContext<ViewportOperation, E>) -> Self {
        Self { context }
    }

    pub fn scroll_to_bottom(&self, smooth: bool) {
        self.notify(ViewportOperation::ScrollTranscriptToBottom { smooth });
    }

    pub fn reveal_composer(&self) {
        self.notify(ViewportOperation::RevealComposer);
    }

    fn notify(&self, operation: ViewportOperation) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(operation).await;
        });
    }
}

pub type ViewportCapability = Viewport<Event>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ViewportOperation {
    ScrollTranscriptToBottom { smooth: bool },
    /// Bring the composer back into the visible area.
    RevealComposer,
}

impl Operation for ViewportOperation {
    type Output = ();
}
