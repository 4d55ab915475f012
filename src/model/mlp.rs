//! Feed-forward classifier stored as a burn record
//!
//! Architecture: Input(16) → [Linear → ReLU] × hidden_dims.len() → Linear(num_classes)
//!
//! The layer widths are not stored in the record, so they come from the
//! `[model]` section of the config and must match the trained network.

use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder};
use burn::tensor::activation::relu;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::features::FeatureVector;
use crate::{EngagementError, ModelConfig, Result};

use super::{argmax, Classifier};

/// Configuration for the MLP network
#[derive(Debug, Clone)]
pub struct MlpConfig {
    pub input_dim: usize,
    pub hidden_dims: Vec<usize>,
    /// Class label emitted for each output logit
    pub classes: Vec<i64>,
}

impl Default for MlpConfig {
    fn default() -> Self {
        MlpConfig {
            input_dim: FeatureVector::DIM,
            hidden_dims: vec![64, 32],
            classes: vec![1, 2, 3],
        }
    }
}

impl MlpConfig {
    pub fn from_model_config(model: &ModelConfig) -> Self {
        MlpConfig {
            input_dim: FeatureVector::DIM,
            hidden_dims: model.hidden_dims.clone(),
            classes: model.classes.clone(),
        }
    }
}

/// A single hidden layer block: Linear → ReLU
#[derive(Module, Debug)]
pub struct HiddenBlock<B: Backend> {
    linear: Linear<B>,
}

impl<B: Backend> HiddenBlock<B> {
    pub fn new(device: &B::Device, in_dim: usize, out_dim: usize) -> Self {
        HiddenBlock {
            linear: LinearConfig::new(in_dim, out_dim).init(device),
        }
    }

    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        relu(self.linear.forward(x))
    }
}

/// Multi-layer perceptron producing one logit per class
#[derive(Module, Debug)]
pub struct MlpNetwork<B: Backend> {
    hidden: Vec<HiddenBlock<B>>,
    output: Linear<B>,
}

impl<B: Backend> MlpNetwork<B> {
    /// Create a freshly initialised network
    pub fn new(device: &B::Device, config: &MlpConfig) -> Self {
        let mut hidden = Vec::with_capacity(config.hidden_dims.len());
        let mut in_dim = config.input_dim;
        for &width in &config.hidden_dims {
            hidden.push(HiddenBlock::new(device, in_dim, width));
            in_dim = width;
        }

        MlpNetwork {
            hidden,
            output: LinearConfig::new(in_dim, config.classes.len()).init(device),
        }
    }

    /// Forward pass
    ///
    /// # Arguments
    /// * `x` - Scaled features [batch, input_dim]
    ///
    /// # Returns
    /// Class logits [batch, num_classes]
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.hidden.iter().fold(x, |x, block| block.forward(x));
        self.output.forward(x)
    }

    /// Save network weights (burn appends `.mpk`)
    pub fn save(&self, path: &str) -> Result<()>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        recorder
            .record(self.clone().into_record(), path.into())
            .map_err(|e| EngagementError::Io(std::io::Error::other(e.to_string())))
    }

    /// Load network weights saved with [`MlpNetwork::save`]
    pub fn load(device: &B::Device, path: &str, config: &MlpConfig) -> Result<Self>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let file = format!("{}.mpk", path);
        if !std::path::Path::new(&file).exists() {
            return Err(EngagementError::MissingArtifact {
                path: file,
                reason: "file not found".to_string(),
            });
        }

        let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        let record: MlpNetworkRecord<B> = recorder
            .load(path.into(), device)
            .map_err(|e| EngagementError::MissingArtifact {
                path: file,
                reason: e.to_string(),
            })?;

        let invalid = |reason: String| EngagementError::InvalidArtifact {
            path: format!("{}.mpk", path),
            reason,
        };
        if record.hidden.len() != config.hidden_dims.len() {
            return Err(invalid(format!(
                "record has {} hidden layers, model.hidden_dims lists {}",
                record.hidden.len(),
                config.hidden_dims.len()
            )));
        }

        let network = Self::new(device, config).load_record(record);
        network.check_shapes(config).map_err(invalid)?;
        Ok(network)
    }

    /// Compare every weight matrix against the widths in `config`
    ///
    /// Loading a record does not check tensor shapes, so a mismatch would
    /// otherwise surface as a panic inside `forward`.
    fn check_shapes(&self, config: &MlpConfig) -> std::result::Result<(), String> {
        let mut in_dim = config.input_dim;
        let layers = self
            .hidden
            .iter()
            .map(|block| &block.linear)
            .zip(config.hidden_dims.iter().copied())
            .chain(std::iter::once((&self.output, config.classes.len())));

        for (i, (linear, out_dim)) in layers.enumerate() {
            let dims = linear.weight.val().dims();
            if dims != [in_dim, out_dim] {
                return Err(format!(
                    "layer {} weight is {:?}, config expects {:?}",
                    i,
                    dims,
                    [in_dim, out_dim]
                ));
            }
            in_dim = out_dim;
        }
        Ok(())
    }
}

/// [`Classifier`] adapter over an [`MlpNetwork`]
pub struct MlpClassifier<B: Backend> {
    network: MlpNetwork<B>,
    classes: Vec<i64>,
    hidden_dims: Vec<usize>,
    device: B::Device,
}

impl<B: Backend> MlpClassifier<B> {
    pub fn new(network: MlpNetwork<B>, config: &MlpConfig, device: B::Device) -> Result<Self> {
        if config.classes.is_empty() {
            return Err(EngagementError::Config(
                "model.classes must list at least one class".to_string(),
            ));
        }
        Ok(MlpClassifier {
            network,
            classes: config.classes.clone(),
            hidden_dims: config.hidden_dims.clone(),
            device,
        })
    }

    pub fn load(device: &B::Device, path: &str, config: MlpConfig) -> Result<Self>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let network = MlpNetwork::load(device, path, &config)?;
        Self::new(network, &config, device.clone())
    }

    /// Convert features to an input tensor [batch, DIM]
    fn features_to_tensor(&self, rows: &[FeatureVector]) -> Tensor<B, 2> {
        let data: Vec<f32> = rows.iter().flat_map(|f| f.to_vec()).collect();
        Tensor::<B, 1>::from_floats(data.as_slice(), &self.device)
            .reshape([rows.len(), FeatureVector::DIM])
    }
}

impl<B: Backend> Classifier for MlpClassifier<B> {
    fn predict(&self, scaled: &FeatureVector) -> Result<i64> {
        let classes = self.predict_batch(std::slice::from_ref(scaled))?;
        classes
            .into_iter()
            .next()
            .ok_or_else(|| EngagementError::Inference("no output row".to_string()))
    }

    fn predict_batch(&self, scaled: &[FeatureVector]) -> Result<Vec<i64>> {
        if scaled.is_empty() {
            return Ok(Vec::new());
        }

        let logits = self.network.forward(self.features_to_tensor(scaled));
        let [batch, num_classes] = logits.dims();
        if batch != scaled.len() || num_classes != self.classes.len() {
            return Err(EngagementError::Inference(format!(
                "network produced [{}, {}] logits for {} rows and {} classes",
                batch,
                num_classes,
                scaled.len(),
                self.classes.len()
            )));
        }

        let values: Vec<f32> = logits.into_data().iter::<f32>().collect();
        values
            .chunks(num_classes)
            .map(|row| {
                argmax(row)
                    .map(|i| self.classes[i])
                    .ok_or_else(|| EngagementError::Inference("empty logit row".to_string()))
            })
            .collect()
    }

    fn describe(&self) -> String {
        format!(
            "mlp, hidden {:?}, classes {:?}",
            self.hidden_dims, self.classes
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn random_features(n: usize) -> Vec<FeatureVector> {
        (0..n)
            .map(|k| {
                let mut values = [0.0f32; FeatureVector::DIM];
                for (i, v) in values.iter_mut().enumerate() {
                    *v = ((k * 7 + i * 3) % 11) as f32 / 5.0 - 1.0;
                }
                FeatureVector::from_array(values)
            })
            .collect()
    }

    #[test]
    fn test_network_shapes() {
        let device = Default::default();
        let network = MlpNetwork::<TestBackend>::new(&device, &MlpConfig::default());

        let x = Tensor::random(
            [4, FeatureVector::DIM],
            burn::tensor::Distribution::Normal(0.0, 1.0),
            &device,
        );
        assert_eq!(network.forward(x).dims(), [4, 3]);
    }

    #[test]
    fn test_no_hidden_layers() {
        let device = Default::default();
        let config = MlpConfig {
            hidden_dims: vec![],
            ..MlpConfig::default()
        };
        let network = MlpNetwork::<TestBackend>::new(&device, &config);
        let x = Tensor::zeros([2, FeatureVector::DIM], &device);
        assert_eq!(network.forward(x).dims(), [2, 3]);
    }

    #[test]
    fn test_predictions_use_configured_classes() {
        let device = Default::default();
        let config = MlpConfig::default();
        let network = MlpNetwork::<TestBackend>::new(&device, &config);
        let classifier = MlpClassifier::new(network, &config, device).unwrap();

        let preds = classifier.predict_batch(&random_features(8)).unwrap();
        assert_eq!(preds.len(), 8);
        assert!(preds.iter().all(|c| [1, 2, 3].contains(c)));
        assert!(classifier.predict_batch(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load_preserve_predictions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engagement_model");
        let path = path.to_str().unwrap();

        let device = Default::default();
        let config = MlpConfig::default();
        let network = MlpNetwork::<TestBackend>::new(&device, &config);
        network.save(path).unwrap();
        let original = MlpClassifier::new(network, &config, device.clone()).unwrap();

        let loaded = MlpClassifier::<TestBackend>::load(&device, path, config).unwrap();
        let features = random_features(5);
        assert_eq!(
            original.predict_batch(&features).unwrap(),
            loaded.predict_batch(&features).unwrap()
        );
    }

    #[test]
    fn test_layer_count_mismatch_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engagement_model");
        let path = path.to_str().unwrap();

        let device = Default::default();
        MlpNetwork::<TestBackend>::new(&device, &MlpConfig::default())
            .save(path)
            .unwrap();

        let shallow = MlpConfig {
            hidden_dims: vec![64],
            ..MlpConfig::default()
        };
        assert!(matches!(
            MlpClassifier::<TestBackend>::load(&device, path, shallow),
            Err(EngagementError::InvalidArtifact { .. })
        ));
    }

    #[test]
    fn test_layer_width_mismatch_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engagement_model");
        let path = path.to_str().unwrap();

        let device = Default::default();
        MlpNetwork::<TestBackend>::new(&device, &MlpConfig::default())
            .save(path)
            .unwrap();

        let narrow = MlpConfig {
            hidden_dims: vec![64, 16],
            ..MlpConfig::default()
        };
        let wide_output = MlpConfig {
            classes: vec![1, 2, 3, 4],
            ..MlpConfig::default()
        };
        for config in [narrow, wide_output] {
            assert!(matches!(
                MlpClassifier::<TestBackend>::load(&device, path, config),
                Err(EngagementError::InvalidArtifact { .. })
            ));
        }
    }

    #[test]
    fn test_missing_record() {
        let device = Default::default();
        let result =
            MlpClassifier::<TestBackend>::load(&device, "/nonexistent/net", MlpConfig::default());
        assert!(matches!(
            result,
            Err(EngagementError::MissingArtifact { .. })
        ));
    }
}
