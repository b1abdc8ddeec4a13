use eframe::egui;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::cli::LaunchOptions;
use crate::config::Config;
use crate::displayable::Schedule;
use crate::parser;
use crate::render::background::{NoVideo, ThemeResolver};
use crate::render::coordinator::{RenderCoordinator, SurfaceId};
use crate::render::dispatch::{self, Command, Inbox, ReadyQueue};
use crate::render::metrics::EguiMetrics;
use crate::render::paint::{SurfacePainter, TextureCache};
use crate::render::surface::{Priority, SurfaceKind};
use crate::theme::parse_color;
use crate::watch::ScheduleWatcher;

const PREVIEW_CANVAS: [f32; 2] = [480.0, 270.0];
const STAGE_CANVAS: [f32; 2] = [1280.0, 720.0];
const PROJECTOR_CANVAS: [f32; 2] = [1920.0, 1080.0];
const FALLBACK_CHORD_COLOR: egui::Color32 = egui::Color32::from_rgb(0xFF, 0xD7, 0x00);

/// Position in the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Cursor {
    item: usize,
    section: usize,
}

impl Cursor {
    fn section_count(self, schedule: &Schedule) -> usize {
        schedule
            .items
            .get(self.item)
            .map_or(0, |i| i.section_count())
    }

    fn clamp(self, schedule: &Schedule) -> Self {
        let item = self.item.min(schedule.items.len().saturating_sub(1));
        let clamped = Self { item, section: 0 };
        Self {
            item,
            section: self
                .section
                .min(clamped.section_count(schedule).saturating_sub(1)),
        }
    }

    fn next_section(self, schedule: &Schedule) -> Self {
        Self {
            section: self.section + 1,
            ..self
        }
        .clamp(schedule)
    }

    fn prev_section(self) -> Self {
        Self {
            section: self.section.saturating_sub(1),
            ..self
        }
    }

    fn next_item(self, schedule: &Schedule) -> Self {
        Self {
            item: self.item + 1,
            section: 0,
        }
        .clamp(schedule)
    }

    fn prev_item(self) -> Self {
        Self {
            item: self.item.saturating_sub(1),
            section: 0,
        }
    }
}

/// Next temporary theme when cycling through `count` named themes.
fn next_theme(current: Option<usize>, count: usize) -> Option<usize> {
    if count == 0 {
        return None;
    }
    Some(current.map_or(0, |i| (i + 1) % count))
}

#[derive(Debug, Clone, PartialEq)]
enum Action {
    NextSection,
    PrevSection,
    NextItem,
    PrevItem,
    Select(Cursor),
    ToggleBlack,
    ToggleClear,
    Restore,
    ToggleLogo,
    CycleTheme,
    ResetTheme,
    ShowNotice(String),
    HideNotice,
    Quit,
}

/// Shortcut keys pressed this frame. Nothing fires while `typing`.
fn key_actions(i: &egui::InputState, typing: bool, actions: &mut Vec<Action>) {
    if typing {
        return;
    }
    let bindings = [
        (egui::Key::ArrowDown, Action::NextSection),
        (egui::Key::ArrowUp, Action::PrevSection),
        (egui::Key::PageDown, Action::NextItem),
        (egui::Key::PageUp, Action::PrevItem),
        (egui::Key::B, Action::ToggleBlack),
        (egui::Key::C, Action::ToggleClear),
        (egui::Key::R, Action::Restore),
        (egui::Key::L, Action::ToggleLogo),
        (egui::Key::T, Action::CycleTheme),
        (egui::Key::Escape, Action::ResetTheme),
        (egui::Key::Q, Action::Quit),
    ];
    for (key, action) in bindings {
        if i.key_pressed(key) {
            actions.push(action);
        }
    }
}

struct ControlApp {
    file: PathBuf,
    schedule: Schedule,
    cursor: Cursor,
    windowed: bool,

    coordinator: RenderCoordinator,
    startup: ReadyQueue<Command>,
    frame_commands: Vec<Command>,
    reloads: Inbox<Schedule>,
    _watcher: Option<ScheduleWatcher>,

    preview: Option<SurfaceId>,
    stage: Option<SurfaceId>,
    projectors: Vec<SurfaceId>,
    projector_count: usize,

    textures: TextureCache,
    chord_color: egui::Color32,
    line_spacing: f32,

    blacked: bool,
    cleared: bool,
    logo: bool,
    theme_cursor: Option<usize>,
    notice_draft: String,
    notice_shown: bool,
}

impl ControlApp {
    fn new(cc: &eframe::CreationContext<'_>, opts: LaunchOptions, schedule: Schedule) -> Self {
        let config = Config::load_or_default().display;
        let chord_color = parse_color(&config.stage_chord_color).unwrap_or_else(|e| {
            tracing::warn!("Invalid stage chord colour, using the default: {e}");
            FALLBACK_CHORD_COLOR
        });
        let line_spacing = config.additional_line_spacing;

        let resolver = ThemeResolver::new(
            Box::new(NoVideo),
            Duration::from_millis(config.clear_fade_duration_ms),
        );
        let coordinator =
            RenderCoordinator::new(config, Box::new(EguiMetrics::new(&cc.egui_ctx)), resolver);

        let (marshal, reloads) = dispatch::channel();
        let watcher = match ScheduleWatcher::spawn(&opts.file, marshal.with_waker(cc.egui_ctx.clone())) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                tracing::warn!("Live reload disabled: {e:#}");
                None
            }
        };

        let cursor = Cursor {
            item: opts.item,
            section: opts.section,
        }
        .clamp(&schedule);

        let mut app = Self {
            file: opts.file,
            schedule,
            cursor,
            windowed: opts.windowed,
            coordinator,
            startup: ReadyQueue::default(),
            frame_commands: Vec::new(),
            reloads,
            _watcher: watcher,
            preview: None,
            stage: None,
            projectors: Vec::new(),
            projector_count: opts.projectors,
            textures: TextureCache::default(),
            chord_color,
            line_spacing,
            blacked: false,
            cleared: false,
            logo: false,
            theme_cursor: None,
            notice_draft: String::new(),
            notice_shown: false,
        };
        app.select(cursor);
        app
    }

    /// Run now, or hold until the surfaces exist.
    fn submit(&mut self, command: Command) {
        if let Some(command) = self.startup.submit(command) {
            self.frame_commands.push(command);
        }
    }

    fn select(&mut self, cursor: Cursor) {
        if cursor.item != self.cursor.item {
            self.theme_cursor = None;
        }
        self.cursor = cursor;
        self.submit(Command::SetDisplayable {
            displayable: self.schedule.items.get(cursor.item).cloned(),
            section: cursor.section,
        });
    }

    fn register_surfaces(&mut self) {
        self.preview = Some(self.coordinator.register_surface(
            SurfaceKind::Preview,
            Priority::Low,
            PREVIEW_CANVAS,
        ));
        self.stage = Some(self.coordinator.register_surface(
            SurfaceKind::Stage,
            Priority::Mid,
            STAGE_CANVAS,
        ));
        self.projectors = (0..self.projector_count)
            .map(|i| {
                self.coordinator
                    .register_surface(SurfaceKind::Projector(i), Priority::High, PROJECTOR_CANVAS)
            })
            .collect();
    }

    fn handle(&mut self, action: Action, ctx: &egui::Context) {
        match action {
            Action::NextSection => self.select(self.cursor.next_section(&self.schedule)),
            Action::PrevSection => self.select(self.cursor.prev_section()),
            Action::NextItem => self.select(self.cursor.next_item(&self.schedule)),
            Action::PrevItem => self.select(self.cursor.prev_item()),
            Action::Select(cursor) => self.select(cursor.clamp(&self.schedule)),
            Action::ToggleBlack => {
                self.blacked = !self.blacked;
                self.submit(Command::SetBlacked(self.blacked));
            }
            Action::ToggleClear => {
                self.cleared = !self.cleared;
                self.submit(Command::SetCleared(self.cleared));
            }
            Action::Restore => {
                self.blacked = false;
                self.cleared = false;
                self.submit(Command::Restore);
            }
            Action::ToggleLogo => {
                self.logo = !self.logo;
                self.submit(Command::SetLogo(self.logo));
            }
            Action::CycleTheme => {
                self.theme_cursor = next_theme(self.theme_cursor, self.schedule.themes.len());
                let theme = self
                    .theme_cursor
                    .and_then(|i| self.schedule.themes.get(i))
                    .cloned();
                self.submit(Command::SetTheme(theme));
            }
            Action::ResetTheme => {
                self.theme_cursor = None;
                self.submit(Command::SetTheme(None));
            }
            Action::ShowNotice(text) => {
                self.notice_shown = true;
                self.submit(Command::SetNotice(Some(text)));
            }
            Action::HideNotice => {
                self.notice_shown = false;
                self.submit(Command::SetNotice(None));
            }
            Action::Quit => ctx.send_viewport_cmd_to(egui::ViewportId::ROOT, egui::ViewportCommand::Close),
        }
    }

    fn apply_reloads(&mut self) {
        let Some(schedule) = self.reloads.drain().pop() else {
            return;
        };
        self.schedule = schedule;
        let cursor = self.cursor.clamp(&self.schedule);
        // An unchanged item keeps its temporary theme.
        self.cursor = cursor;
        self.submit(Command::SetDisplayable {
            displayable: self.schedule.items.get(cursor.item).cloned(),
            section: cursor.section,
        });
        if self
            .theme_cursor
            .is_some_and(|i| i >= self.schedule.themes.len())
        {
            self.theme_cursor = None;
        }
    }

    fn title(&self) -> String {
        self.schedule.title.clone().unwrap_or_else(|| {
            format!(
                "Quelea - {}",
                self.file.file_name().unwrap_or_default().to_string_lossy()
            )
        })
    }

    fn show_schedule(&mut self, ctx: &egui::Context, actions: &mut Vec<Action>) {
        let title = self.title();
        egui::SidePanel::left("schedule")
            .resizable(true)
            .default_width(280.0)
            .show(ctx, |ui| {
                ui.heading(title);
                ui.separator();
                egui::ScrollArea::vertical()
                    .auto_shrink([false, true])
                    .max_height(ui.available_height() - 90.0)
                    .show(ui, |ui| {
                        for (i, item) in self.schedule.items.iter().enumerate() {
                            let selected = i == self.cursor.item;
                            let label = format!("{}. {}  [{}]", i + 1, item.title(), item.kind_label());
                            if ui.selectable_label(selected, label).clicked() {
                                actions.push(Action::Select(Cursor {
                                    item: i,
                                    section: 0,
                                }));
                            }
                            if !selected {
                                continue;
                            }
                            ui.indent("sections", |ui| {
                                for s in 0..item.section_count() {
                                    let name = section_label(item, s);
                                    if ui
                                        .selectable_label(s == self.cursor.section, name)
                                        .clicked()
                                    {
                                        actions.push(Action::Select(Cursor { item: i, section: s }));
                                    }
                                }
                            });
                        }
                    });

                ui.separator();
                ui.label("Notice");
                ui.text_edit_singleline(&mut self.notice_draft);
                ui.horizontal(|ui| {
                    let draft = self.notice_draft.trim();
                    if ui
                        .add_enabled(!draft.is_empty(), egui::Button::new("Show"))
                        .clicked()
                    {
                        actions.push(Action::ShowNotice(draft.to_string()));
                    }
                    if ui
                        .add_enabled(self.notice_shown, egui::Button::new("Hide"))
                        .clicked()
                    {
                        actions.push(Action::HideNotice);
                    }
                });
            });
    }

    fn show_status(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let flag = |on: bool, name: &str| {
                    if on {
                        egui::RichText::new(name).strong().color(egui::Color32::LIGHT_RED)
                    } else {
                        egui::RichText::new(name).weak()
                    }
                };
                ui.label(flag(self.blacked, "BLACK"));
                ui.label(flag(self.cleared, "CLEAR"));
                ui.label(flag(self.logo, "LOGO"));
                let theme = self
                    .coordinator
                    .temp_theme()
                    .map_or("item theme".to_string(), |t| format!("theme: {}", t.name));
                ui.label(theme);
                ui.separator();
                ui.label(
                    egui::RichText::new(
                        "Up/Down section  PgUp/PgDn item  B black  C clear  R restore  \
                         L logo  T theme  Esc item theme  Q quit",
                    )
                    .weak(),
                );
            });
        });
    }

    fn show_monitors(&mut self, ctx: &egui::Context, now: Instant) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.columns(2, |columns| {
                let panes = [("Preview", self.preview), ("Stage", self.stage)];
                for (col, (label, id)) in columns.iter_mut().zip(panes) {
                    col.label(label);
                    let width = col.available_width();
                    let (rect, _) = col.allocate_exact_size(
                        egui::vec2(width, width * 9.0 / 16.0),
                        egui::Sense::hover(),
                    );
                    let pane = col.painter_at(rect);
                    if let Some(surface) = id.and_then(|id| self.coordinator.surface(id)) {
                        SurfacePainter {
                            painter: &pane,
                            textures: &mut self.textures,
                            chord_color: self.chord_color,
                            line_spacing: self.line_spacing,
                        }
                        .paint(rect, surface, now);
                    }
                }
            });
        });
    }

    fn show_projectors(&mut self, ctx: &egui::Context, now: Instant, actions: &mut Vec<Action>) {
        let title = self.title();
        for (index, id) in self.projectors.clone().into_iter().enumerate() {
            let builder = egui::ViewportBuilder::default()
                .with_title(format!("{title} - projector {}", index + 1))
                .with_inner_size([960.0, 540.0])
                .with_fullscreen(!self.windowed);
            ctx.show_viewport_immediate(
                egui::ViewportId::from_hash_of(("projector", index)),
                builder,
                |ctx, class| {
                    ctx.input(|i| {
                        key_actions(i, false, actions);
                        if i.viewport().close_requested() {
                            actions.push(Action::Quit);
                        }
                    });
                    let mut draw = |ui: &mut egui::Ui| {
                        let rect = ui.max_rect();
                        self.coordinator.resize_surface(id, [rect.width(), rect.height()]);
                        self.coordinator.flush(now);
                        if let Some(surface) = self.coordinator.surface(id) {
                            SurfacePainter {
                                painter: ui.painter(),
                                textures: &mut self.textures,
                                chord_color: self.chord_color,
                                line_spacing: self.line_spacing,
                            }
                            .paint(rect, surface, now);
                        }
                    };
                    if matches!(class, egui::ViewportClass::Embedded) {
                        egui::Window::new(format!("Projector {}", index + 1))
                            .default_size([480.0, 270.0])
                            .show(ctx, |ui| draw(ui));
                    } else {
                        egui::CentralPanel::default()
                            .frame(egui::Frame::new().fill(egui::Color32::BLACK).inner_margin(0.0))
                            .show(ctx, |ui| draw(ui));
                    }
                },
            );
        }
    }
}

fn section_label(item: &crate::displayable::Displayable, index: usize) -> String {
    use crate::displayable::Displayable;
    match item {
        Displayable::Text(text) => text.sections.get(index).map_or_else(String::new, |s| {
            if !s.title.is_empty() {
                s.title.clone()
            } else {
                s.lines.first().map(|l| l.trim().to_string()).unwrap_or_default()
            }
        }),
        Displayable::Presentation(_) => format!("Slide {}", index + 1),
        _ => item.kind_label().to_string(),
    }
}

impl eframe::App for ControlApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();

        // Fonts are only usable once a frame has started.
        if !self.startup.is_ready() {
            self.register_surfaces();
            let queued = self.startup.mark_ready();
            self.frame_commands.splice(0..0, queued);
        }

        self.apply_reloads();
        self.coordinator.tick(now);

        let mut actions = Vec::new();
        // Keys typed into the notice field are not shortcuts.
        let typing = ctx.wants_keyboard_input();
        ctx.input(|i| key_actions(i, typing, &mut actions));
        self.show_schedule(ctx, &mut actions);
        self.show_status(ctx);

        for action in std::mem::take(&mut actions) {
            self.handle(action, ctx);
        }
        let commands = std::mem::take(&mut self.frame_commands);
        self.coordinator.apply(commands, now);
        if self.coordinator.temp_theme().is_none() {
            self.theme_cursor = None;
        }

        self.show_monitors(ctx, now);
        self.show_projectors(ctx, now, &mut actions);
        // Keys pressed on a projector take effect next frame.
        if !actions.is_empty() {
            for action in actions {
                self.handle(action, ctx);
            }
            ctx.request_repaint();
        }

        if self.coordinator.is_animating(now) {
            ctx.request_repaint();
        }
    }
}

pub fn run(opts: LaunchOptions) -> anyhow::Result<()> {
    let schedule = parser::load(&opts.file)?;
    if schedule.items.is_empty() {
        anyhow::bail!("No items found in {}", opts.file.display());
    }
    tracing::info!(
        items = schedule.items.len(),
        themes = schedule.themes.len(),
        projectors = opts.projectors,
        "Opening {}",
        opts.file.display()
    );

    let title = schedule.title.clone().unwrap_or_else(|| "Quelea".to_string());
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_title(&title),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(move |cc| Ok(Box::new(ControlApp::new(cc, opts, schedule)))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
