//! 触发调度与每目标工作线程
//!
//! 每个轮换目标（主屏 / 锁屏）有一个专用工作线程，按到达顺序逐个处理触发；
//! 一个计时线程负责定时触发与延迟的跨目标后续触发。

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::NaiveDateTime;

use crate::models::{local_now, Target, TriggerJob};
use crate::utils::error::{AppError, AppResult};

/// 触发调度能力
pub trait TriggerScheduler: Send + Sync {
    /// 在指定时间为目标安排触发，替换该目标尚未执行的定时触发
    fn schedule_at(&self, target: Target, at: NaiveDateTime, job: TriggerJob) -> AppResult<()>;

    /// 延迟后投递一次触发（跨目标后续触发）
    fn dispatch_after(&self, delay: Duration, job: TriggerJob) -> AppResult<()>;

    /// 取消目标尚未执行的定时触发
    fn cancel(&self, target: Target);
}

/// 触发处理者
pub trait JobHandler: Send + Sync {
    fn handle(&self, job: TriggerJob);
}

struct Scheduled {
    due: Instant,
    at: NaiveDateTime,
    job: TriggerJob,
}

/// 计时线程共享状态
struct TimerState {
    scheduled: HashMap<Target, Scheduled>,
    deferred: Vec<(Instant, TriggerJob)>,
    stopped: bool,
}

impl TimerState {
    fn next_due(&self) -> Option<Instant> {
        self.scheduled
            .values()
            .map(|s| s.due)
            .chain(self.deferred.iter().map(|(due, _)| *due))
            .min()
    }

    fn take_due(&mut self, now: Instant) -> Vec<TriggerJob> {
        let mut due = Vec::new();

        let ready: Vec<Target> = self
            .scheduled
            .iter()
            .filter(|(_, s)| s.due <= now)
            .map(|(t, _)| *t)
            .collect();
        for target in ready {
            if let Some(s) = self.scheduled.remove(&target) {
                due.push(s.job);
            }
        }

        let (ready, pending): (Vec<_>, Vec<_>) =
            self.deferred.drain(..).partition(|(at, _)| *at <= now);
        self.deferred = pending;
        due.extend(ready.into_iter().map(|(_, job)| job));

        due
    }
}

type Senders = HashMap<Target, Sender<TriggerJob>>;

/// 每目标工作线程 + 计时线程
pub struct RotationWorkers {
    timer: Arc<(Mutex<TimerState>, Condvar)>,
    senders: Arc<Mutex<Senders>>,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl RotationWorkers {
    /// 创建调度器并启动计时线程；工作线程在 [`start`](Self::start) 时启动
    pub fn new() -> Arc<Self> {
        let timer = Arc::new((
            Mutex::new(TimerState {
                scheduled: HashMap::new(),
                deferred: Vec::new(),
                stopped: false,
            }),
            Condvar::new(),
        ));
        let senders: Arc<Mutex<Senders>> = Arc::new(Mutex::new(HashMap::new()));

        let timer_thread = {
            let timer = timer.clone();
            let senders = senders.clone();
            thread::Builder::new()
                .name("paperize-timer".to_string())
                .spawn(move || run_timer(timer, senders))
        };

        let mut threads = Vec::new();
        match timer_thread {
            Ok(handle) => threads.push(handle),
            Err(e) => tracing::error!("无法启动计时线程: {}", e),
        }

        Arc::new(Self {
            timer,
            senders,
            threads: Mutex::new(threads),
        })
    }

    /// 为每个目标启动专用工作线程
    pub fn start(&self, handler: Arc<dyn JobHandler>) -> AppResult<()> {
        let mut senders = lock(&self.senders);
        let mut threads = lock(&self.threads);

        for target in Target::BOTH {
            if senders.contains_key(&target) {
                continue;
            }
            let (tx, rx) = mpsc::channel();
            let handler = handler.clone();
            let handle = thread::Builder::new()
                .name(format!("paperize-{}", target.as_str()))
                .spawn(move || run_worker(target, rx, handler))?;
            senders.insert(target, tx);
            threads.push(handle);
        }

        tracing::info!("轮换工作线程已启动");
        Ok(())
    }

    /// 立即把触发投递给对应目标的工作线程
    pub fn submit(&self, job: TriggerJob) -> AppResult<()> {
        deliver(&self.senders, job)
    }

    /// 目标尚未执行的定时触发时间
    pub fn scheduled_at(&self, target: Target) -> Option<NaiveDateTime> {
        let (state, _) = &*self.timer;
        lock(state).scheduled.get(&target).map(|s| s.at)
    }

    /// 尚未执行的延迟触发数量
    pub fn deferred_count(&self) -> usize {
        let (state, _) = &*self.timer;
        lock(state).deferred.len()
    }

    /// 停止计时线程与工作线程；正在处理的触发会先完成
    pub fn shutdown(&self) {
        {
            let (state, cvar) = &*self.timer;
            lock(state).stopped = true;
            cvar.notify_all();
        }
        // 关闭通道，工作线程处理完剩余触发后退出
        lock(&self.senders).clear();

        let handles: Vec<JoinHandle<()>> = lock(&self.threads).drain(..).collect();
        let current = thread::current().id();
        for handle in handles {
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                tracing::error!("轮换线程异常退出");
            }
        }
        tracing::info!("轮换工作线程已停止");
    }
}

impl TriggerScheduler for RotationWorkers {
    fn schedule_at(&self, target: Target, at: NaiveDateTime, job: TriggerJob) -> AppResult<()> {
        let delay = (at - local_now()).to_std().unwrap_or(Duration::ZERO);

        let due = due_after(delay)?;

        let (state, cvar) = &*self.timer;
        let mut state = lock(state);
        if state.stopped {
            return Err(AppError::General("调度器已停止".to_string()));
        }
        state.scheduled.insert(target, Scheduled { due, at, job });
        cvar.notify_all();

        tracing::debug!("已安排{}触发: {}", target, at);
        Ok(())
    }

    fn dispatch_after(&self, delay: Duration, job: TriggerJob) -> AppResult<()> {
        let due = due_after(delay)?;

        let (state, cvar) = &*self.timer;
        let mut state = lock(state);
        if state.stopped {
            return Err(AppError::General("调度器已停止".to_string()));
        }
        state.deferred.push((due, job));
        cvar.notify_all();

        tracing::debug!(
            "已安排延迟触发: {} -> {} ({:?})",
            job.trigger.as_str(),
            job.target(),
            delay
        );
        Ok(())
    }

    fn cancel(&self, target: Target) {
        let (state, cvar) = &*self.timer;
        if lock(state).scheduled.remove(&target).is_some() {
            tracing::info!("已取消{}的定时触发", target);
        }
        cvar.notify_all();
    }
}

/// 当前时刻加上延迟；超出 `Instant` 可表示范围时返回配置错误
fn due_after(delay: Duration) -> AppResult<Instant> {
    Instant::now()
        .checked_add(delay)
        .ok_or_else(|| AppError::Config(format!("触发延迟过长: {:?}", delay)))
}

fn deliver(senders: &Mutex<Senders>, job: TriggerJob) -> AppResult<()> {
    let target = job.target();
    let senders = lock(senders);
    let sender = senders
        .get(&target)
        .ok_or_else(|| AppError::General(format!("{} 工作线程未启动", target)))?;
    sender
        .send(job)
        .map_err(|_| AppError::General(format!("{} 工作线程已停止", target)))
}

fn run_worker(target: Target, rx: Receiver<TriggerJob>, handler: Arc<dyn JobHandler>) {
    tracing::debug!("{}工作线程已启动", target);
    while let Ok(job) = rx.recv() {
        handler.handle(job);
    }
    tracing::debug!("{}工作线程已退出", target);
}

fn run_timer(timer: Arc<(Mutex<TimerState>, Condvar)>, senders: Arc<Mutex<Senders>>) {
    let (state_lock, cvar) = &*timer;
    loop {
        let due_jobs = {
            let mut state = lock(state_lock);
            loop {
                if state.stopped {
                    return;
                }
                let now = Instant::now();
                match state.next_due() {
                    Some(due) if due <= now => break state.take_due(now),
                    Some(due) => {
                        state = cvar
                            .wait_timeout(state, due - now)
                            .map(|(guard, _)| guard)
                            .unwrap_or_else(|e| e.into_inner().0);
                    }
                    None => {
                        state = cvar.wait(state).unwrap_or_else(|e| e.into_inner());
                    }
                }
            }
        };

        for job in due_jobs {
            if let Err(e) = deliver(&senders, job) {
                tracing::warn!("无法投递触发 {}: {}", job.trigger.as_str(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RotationMode, Trigger, TriggerParams};
    use std::sync::mpsc::RecvTimeoutError;

    /// 把收到的触发转发到测试通道
    struct ForwardingHandler(Mutex<Sender<(String, TriggerJob)>>);

    impl JobHandler for ForwardingHandler {
        fn handle(&self, job: TriggerJob) {
            let name = thread::current().name().unwrap_or_default().to_string();
            let _ = lock(&self.0).send((name, job));
        }
    }

    fn started() -> (Arc<RotationWorkers>, Receiver<(String, TriggerJob)>) {
        let workers = RotationWorkers::new();
        let (tx, rx) = mpsc::channel();
        workers
            .start(Arc::new(ForwardingHandler(Mutex::new(tx))))
            .unwrap();
        (workers, rx)
    }

    fn job(trigger: Trigger, mode: RotationMode) -> TriggerJob {
        TriggerJob::new(trigger, TriggerParams::default().with_mode(mode))
    }

    #[test]
    fn test_jobs_route_to_target_worker_in_order() {
        let (workers, rx) = started();

        workers.submit(job(Trigger::Start, RotationMode::Combined)).unwrap();
        workers.submit(job(Trigger::Update, RotationMode::Home)).unwrap();
        workers.submit(job(Trigger::Start, RotationMode::Lock)).unwrap();

        let mut received: Vec<(String, TriggerJob)> = (0..3)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        received.sort_by_key(|(name, _)| name.clone());

        let home: Vec<Trigger> = received
            .iter()
            .filter(|(n, _)| n == "paperize-home")
            .map(|(_, j)| j.trigger)
            .collect();
        assert_eq!(home, vec![Trigger::Start, Trigger::Update]);
        assert!(received.iter().any(|(n, j)| n == "paperize-lock" && j.trigger == Trigger::Start));

        workers.shutdown();
    }

    #[test]
    fn test_dispatch_after_delivers_once() {
        let (workers, rx) = started();

        workers
            .dispatch_after(Duration::from_millis(50), job(Trigger::Update, RotationMode::Lock))
            .unwrap();

        let (name, delivered) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name, "paperize-lock");
        assert_eq!(delivered.trigger, Trigger::Update);
        assert!(matches!(
            rx.recv_timeout(Duration::from_millis(200)),
            Err(RecvTimeoutError::Timeout)
        ));
        assert_eq!(workers.deferred_count(), 0);

        workers.shutdown();
    }

    #[test]
    fn test_schedule_replaces_and_cancel_clears() {
        let (workers, rx) = started();
        let later = local_now() + chrono::Duration::hours(1);

        workers
            .schedule_at(Target::Home, later, job(Trigger::Start, RotationMode::Home))
            .unwrap();
        workers
            .schedule_at(
                Target::Home,
                later + chrono::Duration::minutes(5),
                job(Trigger::Start, RotationMode::Home),
            )
            .unwrap();
        assert_eq!(
            workers.scheduled_at(Target::Home),
            Some(later + chrono::Duration::minutes(5))
        );

        workers.cancel(Target::Home);
        assert_eq!(workers.scheduled_at(Target::Home), None);

        // 过去的时间立即触发
        let past = local_now() - chrono::Duration::minutes(1);
        workers
            .schedule_at(Target::Lock, past, job(Trigger::Start, RotationMode::Lock))
            .unwrap();
        let (name, _) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name, "paperize-lock");

        workers.shutdown();
    }

    #[test]
    fn test_unrepresentable_delay_is_rejected_without_killing_workers() {
        let (workers, rx) = started();

        let err = workers
            .dispatch_after(
                Duration::from_secs(u64::MAX),
                job(Trigger::Update, RotationMode::Lock),
            )
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert_eq!(workers.deferred_count(), 0);

        workers.submit(job(Trigger::Start, RotationMode::Lock)).unwrap();
        let (name, _) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name, "paperize-lock");

        workers.shutdown();
    }

    #[test]
    fn test_submit_after_shutdown_fails() {
        let (workers, _rx) = started();
        workers.shutdown();

        assert!(workers.submit(job(Trigger::Start, RotationMode::Home)).is_err());
        assert!(workers
            .dispatch_after(Duration::ZERO, job(Trigger::Start, RotationMode::Home))
            .is_err());
    }
}
