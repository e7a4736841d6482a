use crate::registration::SessionEvent;

pub trait SessionEventPort: Send + Sync {
    fn emit(&self, event: SessionEvent);
}
