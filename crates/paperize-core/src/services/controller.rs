//! 轮换控制器
//!
//! 每个触发信号独立处理：从设置与相册库读取全部状态，决定本次轮换的来源与输出，
//! 渲染并应用壁纸，写回当前 / 下一张指针，最后安排下一次触发。
//! 控制器本身不持有跨触发的状态。

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;

use crate::db::{AlbumRepository, SelectedAlbumRepository};
use crate::events::{EventSinkExt, NextChangePayload, SharedEventSink, NEXT_WALLPAPER_CHANGE};
use crate::models::{
    format_display_time, format_time, local_now, parse_time, RotationConfig, RotationMode,
    SelectedAlbum, SettingKey, Target, Trigger, TriggerJob, TriggerParams,
};
use crate::utils::error::{AppError, AppResult};

use super::applier::WallpaperApplier;
use super::queue::QueueManager;
use super::refresher::{AlbumRefresher, RefreshReport};
use super::renderer::Renderer;
use super::resolver::ContentResolver;
use super::scanner::FolderScanner;
use super::scheduler::{JobHandler, TriggerScheduler};
use super::settings::{load_rotation_config, SettingsStore};

/// 构造控制器所需的协作者
pub struct ControllerDeps {
    pub albums: Arc<dyn AlbumRepository>,
    pub selected: Arc<dyn SelectedAlbumRepository>,
    pub settings: Arc<dyn SettingsStore>,
    pub renderer: Arc<dyn Renderer>,
    pub applier: Arc<dyn WallpaperApplier>,
    pub scheduler: Arc<dyn TriggerScheduler>,
    pub events: SharedEventSink,
    pub resolver: Arc<dyn ContentResolver>,
    pub scanner: Arc<dyn FolderScanner>,
}

/// 一次触发的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// 轮换未启用，已停止调度
    Inactive,
    Rotated {
        uri: String,
        targets: Vec<Target>,
        next: NaiveDateTime,
    },
    /// 候选无法渲染或设置，已驱逐
    Evicted { uri: String, next: NaiveDateTime },
    /// 相册已没有壁纸，选中已级联删除
    AlbumEmptied { album: String },
    Requeued { next: NaiveDateTime },
    Updated { applied: Vec<Target> },
    Refreshed(RefreshReport),
}

/// 本次轮换从哪个队列取候选、应用到哪些目标
#[derive(Debug, Clone, PartialEq, Eq)]
struct RotationPlan {
    source: Target,
    outputs: Vec<Target>,
    /// 间隔不同时需要延迟通知的另一个目标
    follow_up: Option<Target>,
    /// 需要保持定时的目标
    armed: Vec<Target>,
}

impl RotationPlan {
    fn for_job(config: &RotationConfig, params: &TriggerParams, routed: Target) -> Self {
        match (config.set_home, config.set_lock) {
            (true, true) if params.schedule_separately => Self {
                source: routed,
                outputs: vec![routed],
                follow_up: params.intervals_differ().then(|| routed.other()),
                armed: Target::BOTH.to_vec(),
            },
            (true, true) => Self {
                source: Target::Home,
                outputs: Target::BOTH.to_vec(),
                follow_up: None,
                armed: vec![Target::Home],
            },
            (false, true) => Self {
                source: Target::Lock,
                outputs: vec![Target::Lock],
                follow_up: None,
                armed: vec![Target::Lock],
            },
            _ => Self {
                source: Target::Home,
                outputs: vec![Target::Home],
                follow_up: None,
                armed: vec![Target::Home],
            },
        }
    }
}

fn current_key(target: Target) -> SettingKey {
    SettingKey::for_target(
        target,
        SettingKey::CurrentHomeWallpaper,
        SettingKey::CurrentLockWallpaper,
    )
}

fn next_key(target: Target) -> SettingKey {
    SettingKey::for_target(target, SettingKey::NextHomeWallpaper, SettingKey::NextLockWallpaper)
}

fn next_time_key(target: Target) -> SettingKey {
    SettingKey::for_target(target, SettingKey::HomeNextSetTime, SettingKey::LockNextSetTime)
}

pub struct RotationController {
    selected: Arc<dyn SelectedAlbumRepository>,
    settings: Arc<dyn SettingsStore>,
    renderer: Arc<dyn Renderer>,
    applier: Arc<dyn WallpaperApplier>,
    scheduler: Arc<dyn TriggerScheduler>,
    events: SharedEventSink,
    queues: QueueManager,
    refresher: AlbumRefresher,
}

impl RotationController {
    pub fn new(deps: ControllerDeps) -> Self {
        let queues = QueueManager::new(deps.albums.clone(), deps.selected.clone());
        let refresher = AlbumRefresher::new(
            deps.albums,
            deps.selected.clone(),
            deps.resolver,
            deps.scanner,
        )
        .with_scheduler(deps.scheduler.clone());

        Self {
            selected: deps.selected,
            settings: deps.settings,
            renderer: deps.renderer,
            applier: deps.applier,
            scheduler: deps.scheduler,
            events: deps.events,
            queues,
            refresher,
        }
    }

    /// 替换队列管理器（固定洗牌种子）
    pub fn with_queue_manager(mut self, queues: QueueManager) -> Self {
        self.queues = queues;
        self
    }

    /// 首次装载时要投递的触发
    ///
    /// 分开调度且两个目标都启用时，`combined` 触发拆成主屏与锁屏各一个。
    /// `refresh` 作用于整个相册库，始终只投递一次。
    pub fn initial_jobs(&self, trigger: Trigger, params: TriggerParams) -> Vec<TriggerJob> {
        let config = load_rotation_config(self.settings.as_ref());
        if trigger != Trigger::Refresh
            && params.schedule_separately
            && params.mode == RotationMode::Combined
            && config.set_home
            && config.set_lock
        {
            return Target::BOTH
                .iter()
                .map(|t| TriggerJob::new(trigger, params.with_mode(RotationMode::for_target(*t))))
                .collect();
        }
        vec![TriggerJob::new(trigger, params)]
    }

    pub fn process(&self, job: TriggerJob) -> AppResult<Outcome> {
        tracing::debug!(
            "处理触发: {} ({}, home={}m, lock={}m, separate={})",
            job.trigger.as_str(),
            job.params.mode.as_str(),
            job.params.home_interval_minutes,
            job.params.lock_interval_minutes,
            job.params.schedule_separately
        );

        match job.trigger {
            Trigger::Start => self.rotate(job),
            Trigger::Requeue => self.requeue(job),
            Trigger::Update => self.update(job),
            Trigger::Refresh => Ok(Outcome::Refreshed(self.refresher.refresh()?)),
        }
    }

    fn rotate(&self, job: TriggerJob) -> AppResult<Outcome> {
        let config = load_rotation_config(self.settings.as_ref());
        if !config.is_active() {
            tracing::info!("壁纸轮换未启用，停止调度");
            self.halt(&Target::BOTH);
            return Ok(Outcome::Inactive);
        }

        let params = job.params;
        let plan = RotationPlan::for_job(&config, &params, job.target());
        let album = self.resolve_album(&config, &plan)?;

        let candidate = match self.queues.next_candidate(&album, plan.source) {
            Ok(candidate) => candidate,
            Err(AppError::EmptyAlbum(name)) => {
                tracing::warn!("相册 {} 已没有壁纸，取消选中并停止轮换", name);
                self.selected.cascade_delete_album(&name)?;
                self.halt(&plan.outputs);
                return Ok(Outcome::AlbumEmptied { album: name });
            }
            Err(e) => return Err(e),
        };

        // 全部渲染成功后才开始应用
        let mut rendered = Vec::with_capacity(plan.outputs.len());
        for target in &plan.outputs {
            match self.renderer.render(&candidate.uri, config.transform(*target)) {
                Ok(image) => rendered.push((*target, image)),
                Err(e) if e.is_content_failure() => {
                    return self.evicted(&config, &params, &plan, &album, &candidate.uri, e);
                }
                Err(e) => return Err(e),
            }
        }

        for (target, image) in &rendered {
            match self.applier.apply(image, *target) {
                Ok(()) => {}
                Err(e) if e.is_content_failure() => {
                    return self.evicted(&config, &params, &plan, &album, &candidate.uri, e);
                }
                Err(e) => return Err(e),
            }
        }

        let updated = self
            .queues
            .commit(&album, plan.source, candidate.remaining)?;
        self.record_pointers(&config, &plan, &updated, &candidate.uri)?;

        let next = self.schedule_next(&config, &params, &plan)?;

        if let Some(other) = plan.follow_up {
            let delay = Duration::from_secs(config.follow_up_delay_secs);
            tracing::debug!("间隔不同，{:?} 后通知 {} 重新应用", delay, other);
            let follow_up = TriggerJob::new(
                Trigger::Update,
                params.with_mode(RotationMode::for_target(other)),
            );
            if let Err(e) = self.scheduler.dispatch_after(delay, follow_up) {
                tracing::warn!("无法安排{}的后续触发: {}", other, e);
            }
        }

        tracing::info!(
            "已轮换壁纸 {} -> {:?}，下次 {}",
            candidate.uri,
            plan.outputs,
            format_time(&next)
        );

        Ok(Outcome::Rotated {
            uri: candidate.uri,
            targets: plan.outputs,
            next,
        })
    }

    /// 按名称在已选相册中解析来源相册；找不到时停止该目标的轮换
    fn resolve_album(&self, config: &RotationConfig, plan: &RotationPlan) -> AppResult<SelectedAlbum> {
        let found = match config.album_name(plan.source) {
            Some(name) => self.selected.get_selected_album(name)?,
            None => None,
        };

        found.ok_or_else(|| {
            self.halt(&plan.outputs);
            AppError::ConfigurationIncomplete(format!("{} 没有可用的已选相册", plan.source))
        })
    }

    fn evicted(
        &self,
        config: &RotationConfig,
        params: &TriggerParams,
        plan: &RotationPlan,
        album: &SelectedAlbum,
        uri: &str,
        cause: AppError,
    ) -> AppResult<Outcome> {
        tracing::warn!("候选壁纸无效 ({}): {}", uri, cause);
        self.queues.evict(album, plan.source, uri)?;
        let next = self.schedule_next(config, params, plan)?;
        Ok(Outcome::Evicted {
            uri: uri.to_string(),
            next,
        })
    }

    fn record_pointers(
        &self,
        config: &RotationConfig,
        plan: &RotationPlan,
        updated: &SelectedAlbum,
        uri: &str,
    ) -> AppResult<()> {
        let upcoming = updated
            .album
            .queue(plan.source)
            .first()
            .cloned()
            .or_else(|| updated.wallpapers.first().map(|w| w.wallpaper_uri.clone()));

        let mut pointed = plan.outputs.clone();
        // 仅锁屏轮换时，主屏指针跟随锁屏
        if !config.set_home && plan.source == Target::Lock {
            pointed.push(Target::Home);
        }

        for target in pointed {
            self.settings.put_string(current_key(target), uri)?;
            self.settings
                .put_optional(next_key(target), upcoming.as_deref())?;
        }
        self.settings
            .put_string(SettingKey::LastSetTime, &format_time(&local_now()))
    }

    /// 计算并保存下一次更换时间，安排来源目标的下一次触发
    ///
    /// 分开调度时取两个目标中仍在未来的较早者作为通知时间。
    fn schedule_next(
        &self,
        config: &RotationConfig,
        params: &TriggerParams,
        plan: &RotationPlan,
    ) -> AppResult<NaiveDateTime> {
        let now = local_now();
        let target = plan.source;
        let minutes = i64::from(params.interval_minutes(target).max(1));
        let own = now + chrono::Duration::minutes(minutes);

        for t in &plan.outputs {
            self.settings.put_string(next_time_key(*t), &format_time(&own))?;
        }

        let mut next = own;
        if params.schedule_separately && config.set_home && config.set_lock {
            let other = self
                .settings
                .get_string(next_time_key(target.other()))
                .and_then(|v| parse_time(&v))
                .filter(|t| *t > now);
            if let Some(other) = other {
                next = next.min(other);
            }
        }
        self.settings
            .put_string(SettingKey::NextSetTime, &format_time(&next))?;

        let scheduled = if params.mode.target() == target {
            *params
        } else {
            params.with_mode(RotationMode::for_target(target))
        };
        self.scheduler
            .schedule_at(target, own, TriggerJob::new(Trigger::Start, scheduled))?;

        for t in Target::BOTH {
            if !plan.armed.contains(&t) {
                self.scheduler.cancel(t);
            }
        }

        self.notify(config, params, next);
        Ok(next)
    }

    fn notify(&self, config: &RotationConfig, params: &TriggerParams, next: NaiveDateTime) {
        if !params.intervals_differ() && config.set_home != config.set_lock {
            tracing::debug!("单目标同间隔，不发送通知");
            return;
        }

        self.events.emit_typed(
            NEXT_WALLPAPER_CHANGE,
            &NextChangePayload {
                next_set_time: format_time(&next),
                display_time: format_display_time(&next),
            },
        );
    }

    fn requeue(&self, job: TriggerJob) -> AppResult<Outcome> {
        let config = load_rotation_config(self.settings.as_ref());
        if !config.is_active() {
            self.halt(&Target::BOTH);
            return Ok(Outcome::Inactive);
        }

        let plan = RotationPlan::for_job(&config, &job.params, job.target());
        let next = self.schedule_next(&config, &job.params, &plan)?;
        tracing::info!("已重新安排 {}，下次 {}", plan.source, format_time(&next));
        Ok(Outcome::Requeued { next })
    }

    /// 以当前变换设置重新应用当前壁纸；失败只记录，不改动队列
    fn update(&self, job: TriggerJob) -> AppResult<Outcome> {
        let config = load_rotation_config(self.settings.as_ref());
        if !config.is_active() {
            return Ok(Outcome::Inactive);
        }

        let targets: Vec<Target> = match job.params.mode {
            RotationMode::Combined => Target::BOTH.to_vec(),
            _ => vec![job.target()],
        };

        let mut applied = Vec::new();
        for target in targets.into_iter().filter(|t| config.is_enabled(*t)) {
            let Some(uri) = self.settings.get_string(current_key(target)) else {
                tracing::debug!("{} 没有当前壁纸，跳过", target);
                continue;
            };

            let result = self
                .renderer
                .render(&uri, config.transform(target))
                .and_then(|image| self.applier.apply(&image, target));
            match result {
                Ok(()) => applied.push(target),
                Err(e) => tracing::warn!("重新应用{}壁纸失败 ({}): {}", target, uri, e),
            }
        }

        Ok(Outcome::Updated { applied })
    }

    fn halt(&self, targets: &[Target]) {
        for target in targets {
            self.scheduler.cancel(*target);
        }
    }
}

impl JobHandler for RotationController {
    fn handle(&self, job: TriggerJob) {
        match self.process(job) {
            Ok(outcome) => {
                tracing::info!("触发 {} 处理完成: {:?}", job.trigger.as_str(), outcome);
            }
            Err(AppError::ConfigurationIncomplete(msg)) => {
                tracing::warn!("配置不完整，停止轮换: {}", msg);
            }
            Err(e) => {
                tracing::error!("处理触发 {} 失败: {}", job.trigger.as_str(), e);
            }
        }
    }
}
