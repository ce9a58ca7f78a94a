//! Host power transitions requested over the link.

use anyhow::Context;
use camctl_control::{PowerAction, PowerControl, PowerError};
use tokio::sync::mpsc;

/// Forwards power requests from the dispatcher to the async main loop.
///
/// The dispatcher runs on the link receive thread; the request is only
/// queued there and executed once the link is shut down.
#[derive(Debug, Clone)]
pub struct PowerRequests {
    tx: mpsc::UnboundedSender<PowerAction>,
}

impl PowerRequests {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PowerAction>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl PowerControl for PowerRequests {
    fn request(&self, action: PowerAction) -> Result<(), PowerError> {
        tracing::warn!(%action, "power transition requested");
        self.tx
            .send(action)
            .map_err(|_| PowerError::Unavailable("main loop has exited".into()))
    }
}

/// Runs the host command for `action`.
pub async fn execute(action: PowerAction) -> anyhow::Result<()> {
    let (program, args): (&str, &[&str]) = match action {
        PowerAction::Shutdown => ("shutdown", &["-h", "now"]),
        PowerAction::Reboot => ("reboot", &[]),
    };

    tracing::info!(%action, program, "executing power transition");
    let status = tokio::process::Command::new(program)
        .args(args)
        .status()
        .await
        .with_context(|| format!("failed to run {program}"))?;

    anyhow::ensure!(status.success(), "{program} exited with {status}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_reach_the_receiver() {
        let (power, mut rx) = PowerRequests::channel();
        power.reboot().unwrap();
        power.shutdown().unwrap();

        assert_eq!(rx.try_recv().unwrap(), PowerAction::Reboot);
        assert_eq!(rx.try_recv().unwrap(), PowerAction::Shutdown);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_receiver_is_unavailable() {
        let (power, rx) = PowerRequests::channel();
        drop(rx);
        assert!(matches!(
            power.shutdown(),
            Err(PowerError::Unavailable(_))
        ));
    }
}
