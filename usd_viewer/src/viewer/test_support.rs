/// Test doubles for the viewer flow: a stage that records every query and an
/// opener that hands it out with a chosen status.

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::sdf::SdfPath;
use crate::usd::{
    InitialLoadSet, LoadStatus, Prim, SceneStage, Stage, StageOpener, TimeCode, Value,
};

/// One triangle under `/world` and a camera at `/camera1` whose default
/// values differ from its time samples.
pub const CAMERA_SCENE: &str = r#"#usda 1.0
(
    defaultPrim = "world"
    upAxis = "Y"
)

def Xform "world"
{
    def Mesh "tri"
    {
        int[] faceVertexCounts = [3]
        int[] faceVertexIndices = [0, 1, 2]
        point3f[] points = [(-1, 0, 0), (1, 0, 0), (0, 1, 0)]
    }
}

def Camera "camera1"
{
    float focalLength = 50
    float focalLength.timeSamples = {
        1: 100,
        24: 200,
    }
    float2 clippingRange = (1, 1000)
    double3 xformOp:translate = (0, 0, 10)
    double3 xformOp:translate.timeSamples = {
        1: (0, 0, 20),
    }
    uniform token[] xformOpOrder = ["xformOp:translate"]
}
"#;

/// A non-camera prim at `/camera1`.
pub const WRONG_TYPE_SCENE: &str = r#"#usda 1.0

def Xform "camera1"
{
}

def Camera "camera2"
{
}
"#;

pub type PathQueries = Rc<RefCell<Vec<SdfPath>>>;
pub type AttributeReads = Rc<RefCell<Vec<(SdfPath, String, TimeCode)>>>;

/// Stage wrapper recording lookups and attribute reads.
///
/// The logs are shared, so a clone kept by the test still sees queries made
/// after the stage was moved into the viewer.
pub struct RecordingStage {
    pub inner: Stage,
    pub path_queries: PathQueries,
    pub attribute_reads: AttributeReads,
}

impl RecordingStage {
    pub fn new(inner: Stage) -> Self {
        Self {
            inner,
            path_queries: PathQueries::default(),
            attribute_reads: AttributeReads::default(),
        }
    }

    pub fn from_source(source: &str) -> Self {
        Self::new(Stage::from_source("test.usda", source, InitialLoadSet::LoadAll).unwrap())
    }

    pub fn empty() -> Self {
        Self::new(Stage::new("empty.usda", InitialLoadSet::LoadAll))
    }

    /// Distinct times used by attribute reads.
    pub fn read_times(&self) -> Vec<TimeCode> {
        distinct_times(&self.attribute_reads)
    }
}

pub fn distinct_times(reads: &AttributeReads) -> Vec<TimeCode> {
    let mut times: Vec<TimeCode> = Vec::new();
    for (_, _, time) in reads.borrow().iter() {
        if !times.contains(time) {
            times.push(*time);
        }
    }
    times
}

impl SceneStage for RecordingStage {
    fn pseudo_root(&self) -> Prim {
        self.inner.pseudo_root()
    }

    fn prim_at_path(&self, path: &SdfPath) -> Option<Prim> {
        self.path_queries.borrow_mut().push(path.clone());
        self.inner.prim_at_path(path)
    }

    fn children(&self, prim: &Prim) -> Vec<Prim> {
        self.inner.children(prim)
    }

    fn attribute(&self, prim: &Prim, name: &str, time: TimeCode) -> Option<Value> {
        self.attribute_reads
            .borrow_mut()
            .push((prim.path().clone(), name.to_string(), time));
        self.inner.attribute(prim, name, time)
    }

    fn attribute_metadata(&self, prim: &Prim, name: &str, key: &str) -> Option<Value> {
        self.inner.attribute_metadata(prim, name, key)
    }

    fn attribute_names(&self, prim: &Prim) -> Vec<String> {
        self.inner.attribute_names(prim)
    }
}

/// Opener returning a prepared scene with a fixed status.
///
/// Every stage it opens shares the opener's query logs.
pub struct MockStageOpener {
    pub source: Option<&'static str>,
    pub status: LoadStatus,
    pub opened: RefCell<Vec<(PathBuf, InitialLoadSet)>>,
    pub open_count: Cell<usize>,
    pub path_queries: PathQueries,
    pub attribute_reads: AttributeReads,
}

impl MockStageOpener {
    pub fn ok(source: &'static str) -> Self {
        Self {
            source: Some(source),
            status: LoadStatus::Ok,
            opened: RefCell::new(Vec::new()),
            open_count: Cell::new(0),
            path_queries: PathQueries::default(),
            attribute_reads: AttributeReads::default(),
        }
    }

    /// Failing opener: empty stage with `status`.
    pub fn failing(status: LoadStatus) -> Self {
        Self {
            source: None,
            status,
            opened: RefCell::new(Vec::new()),
            open_count: Cell::new(0),
            path_queries: PathQueries::default(),
            attribute_reads: AttributeReads::default(),
        }
    }
}

impl StageOpener for MockStageOpener {
    type Stage = RecordingStage;

    fn open(&self, path: &Path, load_set: InitialLoadSet) -> (RecordingStage, LoadStatus) {
        self.open_count.set(self.open_count.get() + 1);
        self.opened.borrow_mut().push((path.to_path_buf(), load_set));
        let mut stage = match self.source {
            Some(source) => RecordingStage::from_source(source),
            None => RecordingStage::empty(),
        };
        stage.path_queries = Rc::clone(&self.path_queries);
        stage.attribute_reads = Rc::clone(&self.attribute_reads);
        (stage, self.status)
    }
}
