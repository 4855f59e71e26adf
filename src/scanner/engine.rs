//! Scan coordinator: liveness sweep, barrier, port sweep, aggregation

use crate::config::ScanConfig;
use crate::discovery::{HostRange, LivenessProbe, PingProbe};
use crate::ports::PortSpec;
use crate::report::{HostStatus, LivenessResult, PortResult, ReportBuilder, ScanReport};
use crate::scanner::probe::{PortProbe, TcpConnectProbe};
use crate::scanner::{EventSink, ScanEvent};
use crate::ScanError;
use std::future::Future;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinError;

/// Drives a whole scan over a worker pool of `max_concurrency` probes
pub struct ScanCoordinator {
    config: ScanConfig,
    liveness: Arc<dyn LivenessProbe>,
    ports: Arc<dyn PortProbe>,
}

impl ScanCoordinator {
    /// Create a coordinator using `ping` for liveness and TCP connect for ports
    pub fn new(config: ScanConfig) -> crate::Result<Self> {
        config.validate()?;

        let liveness = Arc::new(PingProbe::new(config.liveness_timeout()));
        let ports = Arc::new(TcpConnectProbe::new(config.port_timeout()));

        Ok(Self {
            config,
            liveness,
            ports,
        })
    }

    /// Replace the liveness probe
    pub fn with_liveness_probe<P>(mut self, probe: P) -> Self
    where
        P: LivenessProbe + 'static,
    {
        self.liveness = Arc::new(probe);
        self
    }

    /// Replace the port probe
    pub fn with_port_probe<P>(mut self, probe: P) -> Self
    where
        P: PortProbe + 'static,
    {
        self.ports = Arc::new(probe);
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scan `target` and, when `ports` is given and non-empty, every open
    /// port of the hosts found up.
    ///
    /// Only an invalid range or a failure of the worker pool itself is an
    /// error. Hosts that are down or could not be probed are counted in the
    /// report.
    pub async fn scan(&self, target: &str, ports: Option<&PortSpec>) -> crate::Result<ScanReport> {
        self.run(target, ports, None).await
    }

    /// Same as [`ScanCoordinator::scan`], additionally sending every result
    /// to `events` as soon as its probe finishes. A dropped receiver does not
    /// affect the scan.
    pub async fn scan_with_events(
        &self,
        target: &str,
        ports: Option<&PortSpec>,
        events: mpsc::UnboundedSender<ScanEvent>,
    ) -> crate::Result<ScanReport> {
        self.run(target, ports, Some(&events)).await
    }

    async fn run(
        &self,
        target: &str,
        ports: Option<&PortSpec>,
        events: Option<&EventSink>,
    ) -> crate::Result<ScanReport> {
        let start_time = Instant::now();
        let range = HostRange::parse(target)?;

        log::info!(
            "Scanning {} ({} hosts) using {}, up to {} probes in flight",
            range,
            range.len(),
            self.liveness.method_name(),
            self.config.max_concurrency
        );

        let mut report = ReportBuilder::new(target);

        let liveness = Arc::clone(&self.liveness);
        let probed = self
            .run_pool(
                range.iter(),
                move |host| {
                    let probe = Arc::clone(&liveness);
                    async move { probe.probe(host).await }
                },
                |host, err| {
                    LivenessResult::error(
                        host,
                        format!("probe task panicked: {}", panic_message(err)),
                    )
                },
                |result: LivenessResult| {
                    if let HostStatus::Error { detail } = &result.status {
                        log::warn!("{} could not be probed: {}", result.address, detail);
                    }
                    emit(events, ScanEvent::HostProbed(result.clone()));
                    report.record_liveness(result);
                },
            )
            .await?;

        let up_hosts = report.up_addresses();
        log::info!(
            "Liveness sweep finished: {} of {} hosts up",
            up_hosts.len(),
            probed
        );

        if let Some(spec) = ports.filter(|spec| !spec.is_empty()) {
            if !up_hosts.is_empty() {
                self.sweep_ports(&up_hosts, spec, events, &mut report).await?;
            }
        }

        let report = report.finish(start_time.elapsed());
        log::info!(
            "Scan of {} completed in {:.2}s - {} up, {} down, {} errors, {} open ports",
            target,
            report.duration().as_secs_f64(),
            report.up_count(),
            report.down_count(),
            report.error_count(),
            report.open_port_count()
        );

        Ok(report)
    }

    async fn sweep_ports(
        &self,
        hosts: &[Ipv4Addr],
        spec: &PortSpec,
        events: Option<&EventSink>,
        report: &mut ReportBuilder,
    ) -> crate::Result<()> {
        let ports = spec.to_vec();
        log::info!(
            "Probing {} ports on {} hosts ({} connections)",
            ports.len(),
            hosts.len(),
            ports.len() * hosts.len()
        );
        emit(
            events,
            ScanEvent::PortPhaseStarted {
                hosts: hosts.len(),
                ports: ports.len(),
            },
        );

        let units = hosts
            .iter()
            .flat_map(|&host| ports.iter().map(move |&port| (host, port)));

        let probe = Arc::clone(&self.ports);
        self.run_pool(
            units,
            move |(host, port)| {
                let probe = Arc::clone(&probe);
                async move { probe.probe(host, port).await }
            },
            |(host, port), err| {
                log::warn!(
                    "{}:{} counted as closed, probe task panicked: {}",
                    host,
                    port,
                    panic_message(err)
                );
                PortResult::new(host, port, false)
            },
            |result: PortResult| {
                if result.open {
                    log::debug!("{}:{} open", result.address, result.port);
                    emit(events, ScanEvent::PortOpen(result));
                    report.record_port(result);
                }
            },
        )
        .await?;

        Ok(())
    }

    /// Run `work` for every unit with at most `max_concurrency` tasks alive.
    ///
    /// A permit is taken before each task is spawned and released when the
    /// task ends, so the number of live tasks never exceeds the pool size.
    /// Results are handed to `on_result` in completion order. A task that
    /// panics still yields a result for its unit, built by `on_panic`, so one
    /// broken check never discards the rest of the scan. Returns once every
    /// task has finished.
    async fn run_pool<I, F, Fut, T, P, R>(
        &self,
        units: I,
        work: F,
        on_panic: P,
        mut on_result: R,
    ) -> crate::Result<usize>
    where
        I: Iterator + Send,
        I::Item: Copy + Send + 'static,
        F: Fn(I::Item) -> Fut + Send,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
        P: Fn(I::Item, JoinError) -> T + Copy + Send + 'static,
        R: FnMut(T) + Send,
    {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency));
        let (tx, mut rx) = mpsc::unbounded_channel::<T>();

        let mut dispatched = 0usize;
        let mut received = 0usize;

        for unit in units {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|_| ScanError::Orchestration("worker pool was closed".to_string()))?;

            // The check runs in its own task so a panic surfaces here as a
            // JoinError tied to `unit`
            let handle = tokio::spawn(work(unit));
            let sender = tx.clone();
            tokio::spawn(async move {
                let result = match handle.await {
                    Ok(result) => result,
                    Err(err) => on_panic(unit, err),
                };
                let _ = sender.send(result);
                drop(permit);
            });
            dispatched += 1;

            while let Ok(result) = rx.try_recv() {
                received += 1;
                on_result(result);
            }
        }

        // Barrier: the channel closes once the last task dropped its sender
        drop(tx);
        while let Some(result) = rx.recv().await {
            received += 1;
            on_result(result);
        }

        if received != dispatched {
            return Err(ScanError::Orchestration(format!(
                "{} of {} tasks ended without a result",
                dispatched - received,
                dispatched
            )));
        }

        Ok(received)
    }
}

/// Text of a panic payload, or why the task did not finish
fn panic_message(err: JoinError) -> String {
    if !err.is_panic() {
        return "task was cancelled".to_string();
    }

    let payload = err.into_panic();
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn emit(events: Option<&EventSink>, event: ScanEvent) {
    if let Some(sink) = events {
        let _ = sink.send(event);
    }
}
