//! OS signals mapped to recorder commands

use tokio::sync::mpsc;
use tracing::debug;

/// What a signal asks the running recorder to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    /// SIGINT / SIGTERM: stop and finalize
    Stop,
    /// SIGUSR1: pause or resume
    TogglePause,
    /// SIGUSR2: save a screenshot
    Screenshot,
}

/// Receives [`ControlSignal`]s from the OS signal tasks
pub struct ControlSignals {
    receiver: mpsc::Receiver<ControlSignal>,
}

impl ControlSignals {
    /// Install the handlers. Returns the receiver and a sender for
    /// commands from other sources.
    pub fn install() -> Result<(Self, mpsc::Sender<ControlSignal>), std::io::Error> {
        let (tx, rx) = mpsc::channel(10);
        install_handlers(&tx)?;
        Ok((Self { receiver: rx }, tx))
    }

    /// Wait for the next signal
    pub async fn recv(&mut self) -> Option<ControlSignal> {
        self.receiver.recv().await
    }
}

#[cfg(unix)]
fn install_handlers(tx: &mpsc::Sender<ControlSignal>) -> Result<(), std::io::Error> {
    use tokio::signal::unix::{signal, SignalKind};

    let routes = [
        (SignalKind::interrupt(), ControlSignal::Stop),
        (SignalKind::terminate(), ControlSignal::Stop),
        (SignalKind::user_defined1(), ControlSignal::TogglePause),
        (SignalKind::user_defined2(), ControlSignal::Screenshot),
    ];
    for (kind, command) in routes {
        let mut stream = signal(kind)?;
        let tx = tx.clone();
        tokio::spawn(async move {
            while stream.recv().await.is_some() {
                debug!(?command, "Signal received");
                if tx.send(command).await.is_err() {
                    break;
                }
            }
        });
    }
    Ok(())
}

#[cfg(not(unix))]
fn install_handlers(tx: &mpsc::Sender<ControlSignal>) -> Result<(), std::io::Error> {
    let tx = tx.clone();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if tx.send(ControlSignal::Stop).await.is_err() {
                break;
            }
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn injected_commands_are_delivered() {
        let (mut signals, tx) = ControlSignals::install().unwrap();
        tx.send(ControlSignal::TogglePause).await.unwrap();
        tx.send(ControlSignal::Stop).await.unwrap();
        assert_eq!(signals.recv().await, Some(ControlSignal::TogglePause));
        assert_eq!(signals.recv().await, Some(ControlSignal::Stop));
    }
}
