use crate::error::RenderError;
use crate::Dataset;
use log::debug;
use plotly::common::{Anchor, DashType, LegendGroupTitle, Line, Mode, Orientation, Title};
use plotly::layout::themes::PLOTLY_WHITE;
use plotly::layout::{
    Annotation, Axis, AxisType, GroupClick, HAlign, HoverMode, Legend, Margin,
};
use plotly::{Layout, Plot, Scatter};
use std::path::{Path, PathBuf};

pub const OVERLAY_TITLE: &str = "Bode Magnitude (All CSVs)";
pub const OVERLAY_FILE_NAME: &str = "bode_all.html";
pub const PER_FILE_SUFFIX: &str = "_bode.html";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisScale {
    Linear,
    Log,
}

impl AxisScale {
    fn axis_type(self) -> AxisType {
        match self {
            AxisScale::Linear => AxisType::Linear,
            AxisScale::Log => AxisType::Log,
        }
    }
}

/// One line series of a Figure.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub name: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub dashed: bool,
    pub legend_group: Option<String>,
    pub group_title: Option<String>,
}

impl Trace {
    pub fn new(name: &str, x: Vec<f64>, y: Vec<f64>) -> Trace {
        Trace {
            name: name.to_owned(),
            x,
            y,
            dashed: false,
            legend_group: None,
            group_title: None,
        }
    }

    pub fn dashed(mut self) -> Trace {
        self.dashed = true;
        self
    }

    pub fn in_group(mut self, group: &str) -> Trace {
        self.legend_group = Some(group.to_owned());
        self
    }

    /// Title shown above the legend group, set on its first trace.
    pub fn with_group_title(mut self, title: &str) -> Trace {
        self.group_title = Some(title.to_owned());
        self
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

impl From<&Dataset> for Trace {
    fn from(ds: &Dataset) -> Trace {
        Trace::new(&ds.name, ds.x.clone(), ds.y.clone())
    }
}

/// Traces plus the layout, serialized once to a self-contained html.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub title: String,
    pub x_title: Option<String>,
    pub y_title: Option<String>,
    pub x_scale: AxisScale,
    pub y_scale: AxisScale,
    pub legend_title: Option<String>,
    pub annotation: Option<String>,
    pub unified_hover: bool,
    pub margin_right: usize,
    pub traces: Vec<Trace>,
}

impl Figure {
    pub fn new(title: &str) -> Figure {
        Figure {
            title: title.to_owned(),
            x_title: None,
            y_title: None,
            x_scale: AxisScale::Linear,
            y_scale: AxisScale::Linear,
            legend_title: None,
            annotation: None,
            unified_hover: false,
            margin_right: 160,
            traces: Vec::new(),
        }
    }

    /// Single-file Bode magnitude plot, the labels of the header are the axis titles.
    pub fn bode(ds: &Dataset, x_scale: AxisScale) -> Figure {
        let mut fig = Figure::new(&format!("{} Bode Magnitude", ds.name));
        fig.x_scale = x_scale;
        fig.set_axis_titles(&ds.x_label, &ds.y_label);
        fig.add_trace(Trace::from(ds));
        fig
    }

    /// Empty overlay figure, the traces are added one per file.
    pub fn bode_overlay(x_scale: AxisScale) -> Figure {
        let mut fig = Figure::new(OVERLAY_TITLE);
        fig.x_scale = x_scale;
        fig.margin_right = 200;
        fig
    }

    pub fn set_axis_titles(&mut self, x_title: &str, y_title: &str) {
        self.x_title = Some(x_title.to_owned());
        self.y_title = Some(y_title.to_owned());
    }

    pub fn add_trace(&mut self, trace: Trace) {
        debug!("adding trace {} with {} points", trace.name, trace.len());
        self.traces.push(trace);
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    fn axis(title: &Option<String>, scale: AxisScale) -> Axis {
        let axis = Axis::new().type_(scale.axis_type());
        match title {
            Some(t) => axis.title(Title::new(t.as_str())),
            None => axis,
        }
    }

    /// Build the plotly Plot with one line Scatter per trace.
    pub fn to_plot(&self) -> Plot {
        let mut plot = Plot::new();
        for trace in self.traces.iter() {
            let mut scatter = Scatter::new(trace.x.clone(), trace.y.clone())
                .mode(Mode::Lines)
                .name(trace.name.as_str());
            if trace.dashed {
                scatter = scatter.line(Line::new().dash(DashType::Dash));
            }
            if let Some(group) = &trace.legend_group {
                scatter = scatter.legend_group(group.as_str());
            }
            if let Some(title) = &trace.group_title {
                scatter = scatter.legend_group_title(LegendGroupTitle::new(title.as_str()));
            }
            plot.add_trace(scatter);
        }

        let mut legend = Legend::new()
            .orientation(Orientation::Vertical)
            .x(1.02)
            .y(1.0)
            .x_anchor(Anchor::Left)
            .y_anchor(Anchor::Top);
        if let Some(t) = &self.legend_title {
            legend = legend.title(Title::new(t.as_str()));
        }
        // a click on a grouped trace shows or hides the whole group
        if self.traces.iter().any(|t| t.legend_group.is_some()) {
            legend = legend.group_click(GroupClick::ToggleGroup);
        }
        let mut layout = Layout::new()
            .template(&*PLOTLY_WHITE)
            .title(Title::new(self.title.as_str()))
            .x_axis(Figure::axis(&self.x_title, self.x_scale))
            .y_axis(Figure::axis(&self.y_title, self.y_scale))
            .legend(legend)
            .margin(
                Margin::new()
                    .left(60)
                    .right(self.margin_right)
                    .top(60)
                    .bottom(60),
            );
        if self.unified_hover {
            layout = layout.hover_mode(HoverMode::XUnified);
        }
        if let Some(text) = &self.annotation {
            let note = Annotation::new()
                .x(0.02)
                .y(0.98)
                .x_ref("paper")
                .y_ref("paper")
                .text(text.as_str())
                .align(HAlign::Left)
                .show_arrow(false)
                .border_color("#444")
                .border_width(1.)
                .border_pad(6.)
                .background_color("rgba(255,255,255,0.85)");
            layout = layout.annotations(vec![note]);
        }
        plot.set_layout(layout);
        // plotly.js inline, the html opens offline
        plot.use_local_plotly();
        plot
    }

    /// The html document, with plotly.js inline.
    pub fn to_html(&self) -> String {
        self.to_plot().to_html()
    }

    /// Write the html to the given path, creating the parent directory.
    /// An empty figure is not written.
    pub fn write_html<P>(&self, fout: P) -> Result<PathBuf, RenderError>
    where
        P: AsRef<Path>,
    {
        let path = fout.as_ref().to_owned();
        if self.is_empty() {
            return Err(RenderError::NoTraces(path));
        }
        let write_err = |source| RenderError::Write {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(&path, self.to_html()).map_err(write_err)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    /// The plotly plot as json, to check the traces and the layout.
    fn plot_json(fig: &Figure) -> Value {
        serde_json::from_str(&fig.to_plot().to_json()).unwrap()
    }

    fn dataset(name: &str) -> Dataset {
        Dataset {
            name: name.to_owned(),
            x_label: String::from("freq"),
            y_label: String::from("mag"),
            x: vec![10., 100., 1000.],
            y: vec![0., -3., -20.],
        }
    }

    #[test]
    fn single_file_figure() {
        let fig = Figure::bode(&dataset("filter"), AxisScale::Log);
        assert_eq!(fig.title, "filter Bode Magnitude");
        assert_eq!(fig.x_title.as_deref(), Some("freq"));
        assert_eq!(fig.y_title.as_deref(), Some("mag"));
        assert_eq!(fig.x_scale, AxisScale::Log);
        assert_eq!(fig.y_scale, AxisScale::Linear);
        assert_eq!(fig.traces.len(), 1);
        assert_eq!(fig.traces[0].name, "filter");
        assert_eq!(fig.traces[0].len(), 3);
    }

    #[test]
    fn plot_traces_and_layout() {
        let mut fig = Figure::bode_overlay(AxisScale::Log);
        fig.add_trace(Trace::from(&dataset("a")));
        fig.add_trace(Trace::new("b", vec![1., 2.], vec![3., 4.]).dashed());
        let json = plot_json(&fig);
        let data = json["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["name"], "a");
        assert_eq!(data[0]["x"].as_array().unwrap().len(), 3);
        assert_eq!(data[0]["mode"], "lines");
        assert_eq!(data[1]["name"], "b");
        assert_eq!(data[1]["line"]["dash"], "dash");
        let layout = &json["layout"];
        assert_eq!(layout["xaxis"]["type"], "log");
        assert_eq!(layout["yaxis"]["type"], "linear");
        assert!(layout["template"].is_object());
        // no groups, plotly's default legend click
        assert!(layout["legend"]["groupclick"].is_null());
    }

    #[test]
    fn legend_groups() {
        let mut fig = Figure::new("groups");
        fig.add_trace(Trace::new("A", vec![0.], vec![1.]).in_group("g1").with_group_title("First"));
        fig.add_trace(Trace::new("B", vec![0.], vec![2.]).in_group("g1"));
        let json = plot_json(&fig);
        assert_eq!(json["data"][0]["legendgroup"], "g1");
        assert_eq!(json["data"][0]["legendgrouptitle"]["text"], "First");
        assert!(json["data"][1]["legendgrouptitle"].is_null());
        assert_eq!(json["layout"]["legend"]["groupclick"], "togglegroup");
    }

    #[test]
    fn boxed_annotation() {
        let mut fig = Figure::new("note");
        fig.add_trace(Trace::new("A", vec![0.], vec![1.]));
        fig.annotation = Some(String::from("peak: 1.0 V"));
        let json = plot_json(&fig);
        let note = &json["layout"]["annotations"][0];
        assert_eq!(note["text"], "peak: 1.0 V");
        assert_eq!(note["align"], "left");
        assert_eq!(note["showarrow"], false);
        assert_eq!(note["bordercolor"], "#444");
        assert_eq!(note["bgcolor"], "rgba(255,255,255,0.85)");
    }

    #[test]
    fn html_embeds_plotly_js() {
        let fig = Figure::bode(&dataset("filter"), AxisScale::Log);
        let html = fig.to_html();
        assert!(html.contains("<html"));
        assert!(html.contains("filter Bode Magnitude"));
        // the minified plotly.js alone is a few MB
        assert!(html.len() > 1_000_000, "html is only {} bytes", html.len());
        assert!(!html.contains(r#"<script src="https://cdn.plot.ly"#));
    }

    #[test]
    fn empty_figure_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("empty.html");
        let err = Figure::bode_overlay(AxisScale::Log).write_html(&out).unwrap_err();
        assert!(matches!(err, RenderError::NoTraces(_)));
        assert!(!out.exists());
    }

    #[test]
    fn write_creates_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("plots").join("filter_bode.html");
        let fig = Figure::bode(&dataset("filter"), AxisScale::Linear);
        let written = fig.write_html(&out).unwrap();
        assert_eq!(written, out);
        let html = std::fs::read_to_string(&out).unwrap();
        assert!(html.contains("filter Bode Magnitude"));
        assert!(html.len() > 1_000_000);
    }
}
