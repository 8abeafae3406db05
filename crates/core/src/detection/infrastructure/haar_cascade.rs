//! OpenCV boosted Haar cascade, parsed from the `opencv-cascade-classifier`
//! XML format and evaluated over integral images.

use std::path::Path;
use std::str::FromStr;

use roxmltree::{Document, Node};

use super::integral_image::IntegralImage;
use crate::shared::error::ClassifierLoadError;

/// Subtracted from every stage threshold at load time, as OpenCV does.
const STAGE_THRESHOLD_EPS: f64 = 1e-5;

#[derive(Clone, Debug, PartialEq)]
struct HaarRect {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    weight: f64,
}

#[derive(Clone, Debug, PartialEq)]
struct HaarFeature {
    rects: Vec<HaarRect>,
}

impl HaarFeature {
    fn value(&self, ii: &IntegralImage, x: u32, y: u32) -> f64 {
        self.rects
            .iter()
            .map(|r| r.weight * ii.rect_sum(x + r.x, y + r.y, r.width, r.height) as f64)
            .sum()
    }
}

/// Split node. Positive children index `nodes`, zero or negative ones
/// index `leaves` by their negation.
#[derive(Clone, Debug, PartialEq)]
struct TreeNode {
    left: i32,
    right: i32,
    feature: usize,
    threshold: f64,
}

#[derive(Clone, Debug, PartialEq)]
struct WeakClassifier {
    nodes: Vec<TreeNode>,
    leaves: Vec<f64>,
}

impl WeakClassifier {
    fn evaluate(&self, feature_value: impl Fn(usize) -> f64) -> f64 {
        let mut idx = 0i32;
        loop {
            let node = &self.nodes[idx as usize];
            idx = if feature_value(node.feature) < node.threshold {
                node.left
            } else {
                node.right
            };
            if idx <= 0 {
                return self.leaves[(-idx) as usize];
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Stage {
    threshold: f64,
    classifiers: Vec<WeakClassifier>,
}

/// A loaded face classifier. Read-only after parsing.
#[derive(Clone, Debug, PartialEq)]
pub struct HaarCascade {
    window_width: u32,
    window_height: u32,
    stages: Vec<Stage>,
    features: Vec<HaarFeature>,
}

impl HaarCascade {
    pub fn from_file(path: &Path) -> Result<Self, ClassifierLoadError> {
        if !path.exists() {
            return Err(ClassifierLoadError::NotFound(path.to_path_buf()));
        }
        let xml = std::fs::read_to_string(path).map_err(|source| ClassifierLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cascade = Self::parse(&xml)?;
        log::info!(
            "Loaded Haar cascade {} ({} stages, {} features, {}x{} window)",
            path.display(),
            cascade.stage_count(),
            cascade.features.len(),
            cascade.window_width,
            cascade.window_height
        );
        Ok(cascade)
    }

    pub fn parse(xml: &str) -> Result<Self, ClassifierLoadError> {
        let doc = Document::parse(xml)?;
        let Some(root) = doc.descendants().find(|n| n.has_tag_name("cascade")) else {
            if doc
                .descendants()
                .any(|n| n.attribute("type_id") == Some("opencv-haar-classifier"))
            {
                return Err(ClassifierLoadError::Unsupported(
                    "legacy opencv-haar-classifier layout".into(),
                ));
            }
            return Err(invalid("missing <cascade> element"));
        };

        if let Some(stage_type) = optional_text(root, "stageType") {
            if stage_type != "BOOST" {
                return Err(ClassifierLoadError::Unsupported(format!(
                    "stage type {stage_type}"
                )));
            }
        }
        let feature_type = optional_text(root, "featureType").unwrap_or_default();
        if feature_type != "HAAR" {
            return Err(ClassifierLoadError::Unsupported(format!(
                "feature type {feature_type:?}"
            )));
        }
        if let Some(params) = child(root, "featureParams") {
            if let Some(cats) = optional_text(params, "maxCatCount") {
                if cats != "0" {
                    return Err(ClassifierLoadError::Unsupported(
                        "categorical features".into(),
                    ));
                }
            }
        }

        let window_width: u32 = scalar(required(root, "width")?, "width")?;
        let window_height: u32 = scalar(required(root, "height")?, "height")?;
        if window_width < 3 || window_height < 3 {
            return Err(invalid(format!(
                "window {window_width}x{window_height} is too small"
            )));
        }

        let features = elements(required(root, "features")?)
            .map(|f| parse_feature(f, window_width, window_height))
            .collect::<Result<Vec<_>, _>>()?;
        let stages = elements(required(root, "stages")?)
            .map(parse_stage)
            .collect::<Result<Vec<_>, _>>()?;
        if stages.is_empty() {
            return Err(invalid("cascade has no stages"));
        }

        let cascade = Self {
            window_width,
            window_height,
            stages,
            features,
        };
        cascade.validate()?;
        Ok(cascade)
    }

    pub fn window_width(&self) -> u32 {
        self.window_width
    }

    pub fn window_height(&self) -> u32 {
        self.window_height
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Run every stage on the window whose top-left corner is `(x, y)`.
    ///
    /// Feature responses are divided by the window's standard deviation
    /// (scaled by area) over the rectangle inset by one pixel, so
    /// thresholds are independent of lighting.
    pub fn passes(&self, ii: &IntegralImage, x: u32, y: u32) -> bool {
        let (nw, nh) = (self.window_width - 2, self.window_height - 2);
        let area = (nw * nh) as f64;
        let sum = ii.rect_sum(x + 1, y + 1, nw, nh) as f64;
        let sq_sum = ii.rect_sq_sum(x + 1, y + 1, nw, nh);
        let nf = area * sq_sum - sum * sum;
        let norm = if nf > 0.0 { 1.0 / nf.sqrt() } else { 1.0 };

        let response = |f: usize| self.features[f].value(ii, x, y) * norm;
        self.stages.iter().all(|stage| {
            let total: f64 = stage
                .classifiers
                .iter()
                .map(|wc| wc.evaluate(&response))
                .sum();
            total >= stage.threshold
        })
    }

    fn validate(&self) -> Result<(), ClassifierLoadError> {
        for (s, stage) in self.stages.iter().enumerate() {
            for wc in &stage.classifiers {
                for (k, node) in wc.nodes.iter().enumerate() {
                    if node.feature >= self.features.len() {
                        return Err(invalid(format!(
                            "stage {s} references feature {} of {}",
                            node.feature,
                            self.features.len()
                        )));
                    }
                    for child in [node.left, node.right] {
                        let ok = if child > 0 {
                            (child as usize) > k && (child as usize) < wc.nodes.len()
                        } else {
                            ((-child) as usize) < wc.leaves.len()
                        };
                        if !ok {
                            return Err(invalid(format!(
                                "stage {s} has a tree with dangling child {child}"
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn parse_feature(
    node: Node,
    window_w: u32,
    window_h: u32,
) -> Result<HaarFeature, ClassifierLoadError> {
    if let Some(tilted) = optional_text(node, "tilted") {
        if tilted != "0" {
            return Err(ClassifierLoadError::Unsupported("tilted features".into()));
        }
    }
    let rects = elements(required(node, "rects")?)
        .map(|r| {
            let text = joined_text(r);
            let tokens: Vec<&str> = text.split_whitespace().collect();
            if tokens.len() != 5 {
                return Err(invalid(format!("feature rect {text:?}")));
            }
            let rect = HaarRect {
                x: parse_token(tokens[0], "rect x")?,
                y: parse_token(tokens[1], "rect y")?,
                width: parse_token(tokens[2], "rect width")?,
                height: parse_token(tokens[3], "rect height")?,
                weight: parse_token(tokens[4], "rect weight")?,
            };
            if rect.x + rect.width > window_w || rect.y + rect.height > window_h {
                return Err(invalid(format!("feature rect {text:?} leaves the window")));
            }
            Ok(rect)
        })
        .collect::<Result<Vec<_>, _>>()?;
    if rects.is_empty() {
        return Err(invalid("feature without rects"));
    }
    Ok(HaarFeature { rects })
}

fn parse_stage(node: Node) -> Result<Stage, ClassifierLoadError> {
    let threshold =
        scalar::<f64>(required(node, "stageThreshold")?, "stageThreshold")? - STAGE_THRESHOLD_EPS;
    let classifiers = elements(required(node, "weakClassifiers")?)
        .map(|wc| {
            let internal = joined_text(required(wc, "internalNodes")?);
            let tokens: Vec<&str> = internal.split_whitespace().collect();
            if tokens.is_empty() || tokens.len() % 4 != 0 {
                return Err(invalid(format!("internalNodes {internal:?}")));
            }
            let nodes = tokens
                .chunks_exact(4)
                .map(|t| {
                    Ok(TreeNode {
                        left: parse_token(t[0], "left child")?,
                        right: parse_token(t[1], "right child")?,
                        feature: parse_token(t[2], "feature index")?,
                        threshold: parse_token(t[3], "node threshold")?,
                    })
                })
                .collect::<Result<Vec<_>, ClassifierLoadError>>()?;
            let leaves = numbers(required(wc, "leafValues")?, "leafValues")?;
            Ok(WeakClassifier { nodes, leaves })
        })
        .collect::<Result<Vec<_>, _>>()?;
    if classifiers.is_empty() {
        return Err(invalid("stage without weak classifiers"));
    }
    Ok(Stage {
        threshold,
        classifiers,
    })
}

fn invalid(message: impl Into<String>) -> ClassifierLoadError {
    ClassifierLoadError::Invalid(message.into())
}

fn elements<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(Node::is_element)
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|c| c.has_tag_name(name))
}

fn required<'a, 'input>(
    node: Node<'a, 'input>,
    name: &str,
) -> Result<Node<'a, 'input>, ClassifierLoadError> {
    child(node, name).ok_or_else(|| invalid(format!("missing <{name}>")))
}

fn optional_text(node: Node, name: &str) -> Option<String> {
    child(node, name).map(|c| joined_text(c).trim().to_string())
}

/// Concatenated text children, skipping comments and nested elements.
fn joined_text(node: Node) -> String {
    node.children()
        .filter(Node::is_text)
        .filter_map(|c| c.text())
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_token<T: FromStr>(token: &str, what: &str) -> Result<T, ClassifierLoadError> {
    token
        .parse()
        .map_err(|_| invalid(format!("bad {what}: {token:?}")))
}

fn scalar<T: FromStr>(node: Node, what: &str) -> Result<T, ClassifierLoadError> {
    parse_token(joined_text(node).trim(), what)
}

fn numbers(node: Node, what: &str) -> Result<Vec<f64>, ClassifierLoadError> {
    joined_text(node)
        .split_whitespace()
        .map(|t| parse_token(t, what))
        .collect()
}

/// Minimal one-stage cascade with a single stump, for tests.
#[cfg(test)]
pub(crate) fn stump_cascade_xml(
    window: u32,
    stage_threshold: f64,
    leaves: (f64, f64),
    rects: &[(u32, u32, u32, u32, f64)],
) -> String {
    let rects: String = rects
        .iter()
        .map(|(x, y, w, h, wt)| format!("<_>\n {x} {y} {w} {h} {wt:?}</_>"))
        .collect();
    format!(
        r#"<?xml version="1.0"?>
<opencv_storage>
<cascade type_id="opencv-cascade-classifier">
  <stageType>BOOST</stageType>
  <featureType>HAAR</featureType>
  <height>{window}</height>
  <width>{window}</width>
  <stageParams><maxWeakCount>1</maxWeakCount></stageParams>
  <featureParams><maxCatCount>0</maxCatCount></featureParams>
  <stageNum>1</stageNum>
  <stages>
    <_>
      <maxWeakCount>1</maxWeakCount>
      <stageThreshold>{stage_threshold:?}</stageThreshold>
      <weakClassifiers>
        <!-- tree 0 -->
        <_>
          <internalNodes>
            0 -1 0 0.</internalNodes>
          <leafValues>
            {:?} {:?}</leafValues></_></weakClassifiers></_></stages>
  <features>
    <_>
      <rects>{rects}</rects></_></features></cascade>
</opencv_storage>
"#,
        leaves.0, leaves.1
    )
}
