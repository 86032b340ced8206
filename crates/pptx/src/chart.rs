//! DrawingML chart parts and the slide frames that host them.

use deck_core::deck::DEFAULT_SERIES_NAME;
use deck_core::profile::EMU_PER_INCH;
use deck_core::{ChartPoint, ChartSpec, ChartType};

use crate::xml::{XmlDocument, XmlElement};

const CHART_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/chart";
const DRAWING_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Axis ids shared by the plot and its axes.
const CATEGORY_AXIS_ID: &str = "500000001";
const VALUE_AXIS_ID: &str = "500000002";

/// Position and size of a chart frame on the slide, in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

impl Default for Frame {
    /// 8in x 4in, one inch from the left and two from the top.
    fn default() -> Self {
        Self {
            x: EMU_PER_INCH,
            y: 2 * EMU_PER_INCH,
            cx: 8 * EMU_PER_INCH,
            cy: 4 * EMU_PER_INCH,
        }
    }
}

/// Everything needed to render a single-series chart part.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub kind: ChartType,
    pub title: Option<String>,
    pub series_name: String,
    pub points: Vec<ChartPoint>,
}

impl From<&ChartSpec> for ChartData {
    fn from(spec: &ChartSpec) -> Self {
        Self {
            kind: spec.chart_type,
            title: spec.title.clone().filter(|t| !t.is_empty()),
            series_name: DEFAULT_SERIES_NAME.to_string(),
            points: spec.data.clone(),
        }
    }
}

impl ChartData {
    /// Recover kind, title and data from an existing chart part.
    pub fn read(doc: &XmlDocument) -> Self {
        let chart = doc.root.child("chart");
        let plot = chart.and_then(|c| c.child("plotArea"));

        let kind = plot
            .and_then(|p| {
                p.elements().find_map(|e| match e.local_name() {
                    "barChart" | "bar3DChart" => Some(match e.child("barDir").and_then(|d| d.attr("val")) {
                        Some("bar") => ChartType::Bar,
                        _ => ChartType::Column,
                    }),
                    "lineChart" | "line3DChart" => Some(ChartType::Line),
                    "pieChart" | "pie3DChart" | "doughnutChart" => Some(ChartType::Pie),
                    _ => None,
                })
            })
            .unwrap_or_default();

        let title = chart
            .and_then(|c| c.child("title"))
            .map(|t| t.descendants("t").iter().map(|e| e.text()).collect::<String>())
            .filter(|t| !t.is_empty());

        let series = plot.map(|p| p.descendants("ser")).unwrap_or_default();
        let first = series.first();

        let series_name = first
            .and_then(|s| s.child("tx"))
            .map(|tx| tx.descendants("v").iter().map(|v| v.text()).collect::<String>())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| DEFAULT_SERIES_NAME.to_string());

        let categories: Vec<String> = first
            .and_then(|s| s.child("cat"))
            .map(|c| c.descendants("pt").iter().map(|pt| pt.text()).collect())
            .unwrap_or_default();
        let values: Vec<f64> = first
            .and_then(|s| s.child("val"))
            .map(|v| {
                v.descendants("pt")
                    .iter()
                    .map(|pt| pt.text().trim().parse().unwrap_or(0.0))
                    .collect()
            })
            .unwrap_or_default();

        let points = categories
            .into_iter()
            .zip(values)
            .map(|(category, value)| ChartPoint { category, value })
            .collect();

        Self {
            kind,
            title,
            series_name,
            points,
        }
    }

    /// Render the chart part.
    pub fn to_document(&self) -> XmlDocument {
        let mut chart = XmlElement::new("c:chart");
        match &self.title {
            Some(title) => {
                chart.push(title_element(title));
                chart.push(val("c:autoTitleDeleted", "0"));
            }
            None => chart.push(val("c:autoTitleDeleted", "1")),
        }

        let mut plot_area = XmlElement::new("c:plotArea").with_child(XmlElement::new("c:layout"));
        plot_area.push(self.plot());
        if self.kind != ChartType::Pie {
            let (cat_pos, val_pos) = match self.kind {
                ChartType::Bar => ("l", "b"),
                _ => ("b", "l"),
            };
            plot_area.push(category_axis(cat_pos));
            plot_area.push(value_axis(val_pos));
        }
        chart.push(plot_area);

        chart.push(
            XmlElement::new("c:legend")
                .with_child(val("c:legendPos", "r"))
                .with_child(val("c:overlay", "0")),
        );
        chart.push(val("c:plotVisOnly", "1"));
        chart.push(val("c:dispBlanksAs", "gap"));

        let root = XmlElement::new("c:chartSpace")
            .with_attr("xmlns:c", CHART_NS)
            .with_attr("xmlns:a", DRAWING_NS)
            .with_attr("xmlns:r", REL_NS)
            .with_child(val("c:date1904", "0"))
            .with_child(val("c:roundedCorners", "0"))
            .with_child(chart);

        XmlDocument::new(root)
    }

    fn plot(&self) -> XmlElement {
        match self.kind {
            ChartType::Bar | ChartType::Column => {
                let dir = if self.kind == ChartType::Bar { "bar" } else { "col" };
                XmlElement::new("c:barChart")
                    .with_child(val("c:barDir", dir))
                    .with_child(val("c:grouping", "clustered"))
                    .with_child(val("c:varyColors", "0"))
                    .with_child(self.series(Some(val("c:invertIfNegative", "0")), None))
                    .with_child(val("c:gapWidth", "150"))
                    .with_child(val("c:axId", CATEGORY_AXIS_ID))
                    .with_child(val("c:axId", VALUE_AXIS_ID))
            }
            ChartType::Line => XmlElement::new("c:lineChart")
                .with_child(val("c:grouping", "standard"))
                .with_child(val("c:varyColors", "0"))
                .with_child(self.series(
                    Some(XmlElement::new("c:marker").with_child(val("c:symbol", "none"))),
                    Some(val("c:smooth", "0")),
                ))
                .with_child(val("c:marker", "1"))
                .with_child(val("c:axId", CATEGORY_AXIS_ID))
                .with_child(val("c:axId", VALUE_AXIS_ID)),
            ChartType::Pie => XmlElement::new("c:pieChart")
                .with_child(val("c:varyColors", "1"))
                .with_child(self.series(None, None))
                .with_child(val("c:firstSliceAng", "0")),
        }
    }

    /// The single `c:ser`; `before_cat` and `after_val` carry the
    /// chart-type specific elements the schema orders around the data.
    fn series(&self, before_cat: Option<XmlElement>, after_val: Option<XmlElement>) -> XmlElement {
        let last_row = self.points.len() + 1;
        let count = self.points.len().to_string();

        let name = XmlElement::new("c:tx").with_child(
            XmlElement::new("c:strRef")
                .with_child(XmlElement::new("c:f").with_text("Sheet1!$B$1"))
                .with_child(
                    XmlElement::new("c:strCache")
                        .with_child(val("c:ptCount", "1"))
                        .with_child(point(0, &self.series_name)),
                ),
        );

        let mut categories = XmlElement::new("c:strCache").with_child(val("c:ptCount", &count));
        let mut values = XmlElement::new("c:numCache")
            .with_child(XmlElement::new("c:formatCode").with_text("General"))
            .with_child(val("c:ptCount", &count));
        for (i, p) in self.points.iter().enumerate() {
            categories.push(point(i, &p.category));
            values.push(point(i, &p.value.to_string()));
        }

        let mut ser = XmlElement::new("c:ser")
            .with_child(val("c:idx", "0"))
            .with_child(val("c:order", "0"))
            .with_child(name);
        if let Some(extra) = before_cat {
            ser.push(extra);
        }
        ser.push(
            XmlElement::new("c:cat").with_child(
                XmlElement::new("c:strRef")
                    .with_child(XmlElement::new("c:f").with_text(format!("Sheet1!$A$2:$A${}", last_row)))
                    .with_child(categories),
            ),
        );
        ser.push(
            XmlElement::new("c:val").with_child(
                XmlElement::new("c:numRef")
                    .with_child(XmlElement::new("c:f").with_text(format!("Sheet1!$B$2:$B${}", last_row)))
                    .with_child(values),
            ),
        );
        if let Some(extra) = after_val {
            ser.push(extra);
        }
        ser
    }
}

/// `p:graphicFrame` placing the chart related by `rel_id` on a slide.
pub fn graphic_frame(shape_id: u32, name: &str, rel_id: &str, frame: Frame) -> XmlElement {
    XmlElement::new("p:graphicFrame")
        .with_child(
            XmlElement::new("p:nvGraphicFramePr")
                .with_child(
                    XmlElement::new("p:cNvPr")
                        .with_attr("id", shape_id.to_string())
                        .with_attr("name", name),
                )
                .with_child(
                    XmlElement::new("p:cNvGraphicFramePr")
                        .with_child(XmlElement::new("a:graphicFrameLocks").with_attr("noGrp", "1")),
                )
                .with_child(XmlElement::new("p:nvPr")),
        )
        .with_child(
            XmlElement::new("p:xfrm")
                .with_child(
                    XmlElement::new("a:off")
                        .with_attr("x", frame.x.to_string())
                        .with_attr("y", frame.y.to_string()),
                )
                .with_child(
                    XmlElement::new("a:ext")
                        .with_attr("cx", frame.cx.to_string())
                        .with_attr("cy", frame.cy.to_string()),
                ),
        )
        .with_child(
            XmlElement::new("a:graphic").with_child(
                XmlElement::new("a:graphicData")
                    .with_attr("uri", CHART_NS)
                    .with_child(
                        XmlElement::new("c:chart")
                            .with_attr("xmlns:c", CHART_NS)
                            .with_attr("xmlns:r", REL_NS)
                            .with_attr("r:id", rel_id),
                    ),
            ),
        )
}

/// Relationship id of the chart hosted by a graphic frame, if any.
pub fn chart_rel_id(frame: &XmlElement) -> Option<&str> {
    let data = frame.find(&["graphic", "graphicData"])?;
    if data.attr("uri") != Some(CHART_NS) {
        return None;
    }
    data.child("chart")?.attr("r:id")
}

fn title_element(text: &str) -> XmlElement {
    XmlElement::new("c:title")
        .with_child(
            XmlElement::new("c:tx").with_child(
                XmlElement::new("c:rich")
                    .with_child(XmlElement::new("a:bodyPr"))
                    .with_child(XmlElement::new("a:lstStyle"))
                    .with_child(
                        XmlElement::new("a:p").with_child(
                            XmlElement::new("a:r")
                                .with_child(XmlElement::new("a:rPr").with_attr("lang", "en-US"))
                                .with_child(XmlElement::new("a:t").with_text(text)),
                        ),
                    ),
            ),
        )
        .with_child(val("c:overlay", "0"))
}

fn category_axis(position: &str) -> XmlElement {
    XmlElement::new("c:catAx")
        .with_child(val("c:axId", CATEGORY_AXIS_ID))
        .with_child(XmlElement::new("c:scaling").with_child(val("c:orientation", "minMax")))
        .with_child(val("c:delete", "0"))
        .with_child(val("c:axPos", position))
        .with_child(
            XmlElement::new("c:numFmt")
                .with_attr("formatCode", "General")
                .with_attr("sourceLinked", "1"),
        )
        .with_child(val("c:majorTickMark", "out"))
        .with_child(val("c:minorTickMark", "none"))
        .with_child(val("c:tickLblPos", "nextTo"))
        .with_child(val("c:crossAx", VALUE_AXIS_ID))
        .with_child(val("c:crosses", "autoZero"))
        .with_child(val("c:auto", "1"))
        .with_child(val("c:lblAlgn", "ctr"))
        .with_child(val("c:lblOffset", "100"))
        .with_child(val("c:noMultiLvlLbl", "0"))
}

fn value_axis(position: &str) -> XmlElement {
    XmlElement::new("c:valAx")
        .with_child(val("c:axId", VALUE_AXIS_ID))
        .with_child(XmlElement::new("c:scaling").with_child(val("c:orientation", "minMax")))
        .with_child(val("c:delete", "0"))
        .with_child(val("c:axPos", position))
        .with_child(XmlElement::new("c:majorGridlines"))
        .with_child(
            XmlElement::new("c:numFmt")
                .with_attr("formatCode", "General")
                .with_attr("sourceLinked", "1"),
        )
        .with_child(val("c:majorTickMark", "out"))
        .with_child(val("c:minorTickMark", "none"))
        .with_child(val("c:tickLblPos", "nextTo"))
        .with_child(val("c:crossAx", CATEGORY_AXIS_ID))
        .with_child(val("c:crosses", "autoZero"))
        .with_child(val("c:crossBetween", "between"))
}

fn val(name: &str, value: &str) -> XmlElement {
    XmlElement::new(name).with_attr("val", value)
}

fn point(idx: usize, value: &str) -> XmlElement {
    XmlElement::new("c:pt")
        .with_attr("idx", idx.to_string())
        .with_child(XmlElement::new("c:v").with_text(value))
}
