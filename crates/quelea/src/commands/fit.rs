use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use colored::Colorize;

use crate::config::{Config, DisplayConfig};
use crate::displayable::{Displayable, Schedule};
use crate::parser;
use crate::render::background::{NoVideo, ThemeResolver};
use crate::render::coordinator::RenderCoordinator;
use crate::render::metrics::ApproxMetrics;
use crate::render::surface::{Priority, SurfaceKind};

/// Layout chosen for one section on the measured canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionFit {
    pub title: String,
    pub size: f32,
    pub lines: Vec<String>,
    pub small_text: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemFit {
    /// 1-indexed position in the schedule.
    pub number: usize,
    pub title: String,
    pub kind: &'static str,
    /// Empty for media items.
    pub sections: Vec<SectionFit>,
}

pub fn run(file: &Path, item: Option<usize>, width: u32, height: u32) -> Result<()> {
    let schedule = parser::load(file)?;
    let config = Config::load_or_default().display;
    let fits = measure(&schedule, config, item, [width as f32, height as f32])?;

    if let Some(title) = &schedule.title {
        println!("{}", title.bold());
    }
    println!("{}", format!("Canvas {width}x{height}, approximate metrics").dimmed());

    for fit in fits {
        println!();
        println!(
            "{} {} {}",
            format!("{:>2}.", fit.number).dimmed(),
            fit.title.bold(),
            format!("[{}]", fit.kind).cyan()
        );
        if fit.sections.is_empty() {
            println!("    {}", "no text".dimmed());
        }
        for section in fit.sections {
            let title = if section.title.is_empty() {
                "(untitled)".to_string()
            } else {
                section.title
            };
            println!(
                "  {} {}",
                title.yellow(),
                format!("{:.1}pt", section.size).green()
            );
            for line in section.lines {
                println!("    {line}");
            }
            for line in section.small_text {
                println!("    {}", line.dimmed());
            }
        }
    }
    Ok(())
}

/// Lay out every section of the schedule (or of item `only`, 1-indexed) on a
/// single projector-sized surface.
pub fn measure(
    schedule: &Schedule,
    config: DisplayConfig,
    only: Option<usize>,
    canvas: [f32; 2],
) -> Result<Vec<ItemFit>> {
    let selected: Vec<(usize, &Arc<Displayable>)> = match only {
        Some(n) => match n.checked_sub(1).and_then(|i| schedule.items.get(i)) {
            Some(item) => vec![(n, item)],
            None => anyhow::bail!(
                "Item {n} does not exist (schedule has {} items)",
                schedule.items.len()
            ),
        },
        None => schedule
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| (i + 1, item))
            .collect(),
    };

    let resolver = ThemeResolver::new(Box::new(NoVideo), Duration::ZERO);
    let mut coordinator = RenderCoordinator::new(config, Box::new(ApproxMetrics::default()), resolver);
    let surface = coordinator.register_surface(SurfaceKind::Projector(0), Priority::High, canvas);

    let mut fits = Vec::with_capacity(selected.len());
    for (number, item) in selected {
        let mut fit = ItemFit {
            number,
            title: item.title().to_string(),
            kind: item.kind_label(),
            sections: Vec::new(),
        };
        if let Displayable::Text(text) = item.as_ref() {
            for (index, section) in text.sections.iter().enumerate() {
                coordinator.set_displayable(Some(Arc::clone(item)), index);
                coordinator.flush(Instant::now());
                let shown = coordinator
                    .surface(surface)
                    .and_then(|s| s.shown_text());
                fit.sections.push(SectionFit {
                    title: section.title.clone(),
                    size: shown.map_or(0.0, |b| b.size),
                    lines: shown
                        .map(|b| b.lines.iter().map(|l| l.text().to_string()).collect())
                        .unwrap_or_default(),
                    small_text: shown
                        .map(|b| b.small_text.iter().map(|l| l.text().to_string()).collect())
                        .unwrap_or_default(),
                });
            }
        }
        fits.push(fit);
    }
    Ok(fits)
}
