use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Jeton d'annulation partagé de la boucle de ticks.
///
/// `cancel()` est idempotent et peut être appelé avant même que la boucle
/// ne démarre. Clonable, `Send + Sync`, zero-lock.
///
/// # Example
/// ```
/// use gc_core::schedule::CancelToken;
/// let token = CancelToken::new();
/// let handle = token.clone();
/// assert!(!token.is_cancelled());
/// handle.cancel();
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Nouveau jeton, non annulé.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Demande l'arrêt au prochain tick.
    #[inline]
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// `true` une fois `cancel()` appelé.
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Cadence des ticks d'affichage.
///
/// # Example
/// ```
/// use gc_core::schedule::TickSchedule;
/// use std::time::Duration;
/// let schedule = TickSchedule::new(50);
/// assert_eq!(schedule.period(), Duration::from_millis(20));
/// ```
#[derive(Clone, Debug)]
pub struct TickSchedule {
    period: Duration,
    last: Option<Instant>,
}

impl TickSchedule {
    /// Cadence à `fps` ticks par seconde (au moins 1).
    #[must_use]
    pub fn new(fps: u32) -> Self {
        Self {
            period: Self::period_for(fps),
            last: None,
        }
    }

    fn period_for(fps: u32) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(fps.max(1)))
    }

    /// Durée entre deux ticks.
    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Change la cadence (hot-reload). Le prochain tick en tient compte.
    pub fn set_fps(&mut self, fps: u32) {
        self.period = Self::period_for(fps);
    }

    /// Temps restant avant le prochain tick. Zéro si dû (ou premier tick).
    #[must_use]
    pub fn remaining(&self, now: Instant) -> Duration {
        self.last.map_or(Duration::ZERO, |last| {
            self.period.saturating_sub(now.saturating_duration_since(last))
        })
    }

    /// Marque le début d'un tick.
    pub fn mark(&mut self, now: Instant) {
        self.last = Some(now);
    }
}

/// Boucle de ticks explicite : appelle `on_tick` à chaque échéance jusqu'à
/// annulation ou `ControlFlow::Break`.
///
/// Le jeton est vérifié à chaque frontière de tick, avant et après l'attente.
/// Retourne le nombre de ticks exécutés.
///
/// # Example
/// ```
/// use gc_core::schedule::{run_ticks, CancelToken, TickSchedule};
/// use std::ops::ControlFlow;
///
/// let token = CancelToken::new();
/// let ran = run_ticks(&mut TickSchedule::new(1000), &token, |n| {
///     if n == 2 { ControlFlow::Break(()) } else { ControlFlow::Continue(()) }
/// });
/// assert_eq!(ran, 3);
/// ```
pub fn run_ticks(
    schedule: &mut TickSchedule,
    token: &CancelToken,
    mut on_tick: impl FnMut(u64) -> ControlFlow<()>,
) -> u64 {
    let mut ticks = 0u64;
    while !token.is_cancelled() {
        let wait = schedule.remaining(Instant::now());
        if !wait.is_zero() {
            thread::sleep(wait);
            if token.is_cancelled() {
                break;
            }
        }
        schedule.mark(Instant::now());
        let flow = on_tick(ticks);
        ticks += 1;
        if flow.is_break() {
            break;
        }
    }
    log::debug!("Boucle de ticks terminée après {ticks} ticks");
    ticks
}
