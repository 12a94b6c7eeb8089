use burn::{
    data::{
        dataloader::batcher::Batcher,
        dataset::{
            Dataset,
            vision::{MnistDataset, MnistItem},
        },
    },
    prelude::*,
};

pub const WIDTH: usize = 28;
pub const HEIGHT: usize = 28;
pub const NUM_PIXELS: usize = WIDTH * HEIGHT;
pub const NUM_CLASSES: usize = 10;

/// Fetches the train and test splits of MNIST.
///
/// The files are downloaded from the CVDF mirror on first use and cached by
/// the framework; subsequent runs read from the cache. Sample counts are
/// whatever the source provides, so callers must read them from the returned
/// datasets instead of assuming the historical 60000/10000.
pub fn load() -> (MnistDataset, MnistDataset) {
    let train = MnistDataset::train();
    let test = MnistDataset::test();
    assert!(
        !train.is_empty() && !test.is_empty(),
        "MNIST source returned an empty split"
    );
    log::debug!(
        "loaded MNIST: {} train items, {} test items",
        train.len(),
        test.len()
    );

    (train, test)
}

/// Encodes a class label as a one-hot vector: 1.0 at index `label`, 0.0
/// elsewhere.
pub fn one_hot(label: u8) -> [f32; NUM_CLASSES] {
    assert!(
        (label as usize) < NUM_CLASSES,
        "label {label} outside of the {NUM_CLASSES} MNIST classes"
    );
    let mut encoding = [0.0; NUM_CLASSES];
    encoding[label as usize] = 1.0;
    encoding
}

#[derive(Clone, Default)]
pub struct MnistBatcher;

/// One batch of preprocessed items.
#[derive(Clone, Debug)]
pub struct MnistBatch<B: Backend> {
    /// Flattened images, `[batch_size, 784]`, values in [0, 1].
    pub images: Tensor<B, 2>,

    /// One-hot encoded labels, `[batch_size, 10]`.
    pub targets_one_hot: Tensor<B, 2>,

    /// Class ids, `[batch_size]`, as the accuracy metric expects them.
    pub targets: Tensor<B, 1, Int>,
}

impl<B: Backend> Batcher<B, MnistItem, MnistBatch<B>> for MnistBatcher {
    fn batch(&self, items: Vec<MnistItem>, device: &B::Device) -> MnistBatch<B> {
        let images = items
            .iter()
            .map(|item| TensorData::from(item.image).convert::<B::FloatElem>())
            .map(|data| Tensor::<B, 2>::from_data(data, device))
            .map(|tensor| tensor.reshape([1, NUM_PIXELS]))
            // Scale 0-255 pixel intensities into [0, 1].
            .map(|tensor| tensor / 255)
            .collect();

        let targets_one_hot = items
            .iter()
            .map(|item| TensorData::from([one_hot(item.label)]).convert::<B::FloatElem>())
            .map(|data| Tensor::<B, 2>::from_data(data, device))
            .collect();

        let targets = items
            .iter()
            .map(|item| {
                Tensor::<B, 1, Int>::from_data([(item.label as i64).elem::<B::IntElem>()], device)
            })
            .collect();

        MnistBatch {
            images: Tensor::cat(images, 0),
            targets_one_hot: Tensor::cat(targets_one_hot, 0),
            targets: Tensor::cat(targets, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn item_with_constant_pixels(value: f32, label: u8) -> MnistItem {
        MnistItem {
            image: [[value; WIDTH]; HEIGHT],
            label,
        }
    }

    #[test]
    fn one_hot_sets_exactly_the_label_index() {
        for label in 0..NUM_CLASSES as u8 {
            let encoding = one_hot(label);
            assert_eq!(encoding[label as usize], 1.0);
            assert_eq!(encoding.iter().sum::<f32>(), 1.0);
            assert_eq!(
                encoding.iter().filter(|&&value| value == 0.0).count(),
                NUM_CLASSES - 1
            );
        }
    }

    #[test]
    #[should_panic(expected = "outside of the 10 MNIST classes")]
    fn one_hot_rejects_labels_past_nine() {
        one_hot(10);
    }

    #[test]
    fn batch_normalizes_pixels_into_unit_range() {
        let device = Default::default();
        let items = vec![
            item_with_constant_pixels(0.0, 0),
            item_with_constant_pixels(128.0, 1),
            item_with_constant_pixels(255.0, 2),
        ];

        let batch: MnistBatch<TestBackend> = MnistBatcher.batch(items, &device);
        assert_eq!(batch.images.dims(), [3, NUM_PIXELS]);

        let values = batch.images.to_data().to_vec::<f32>().unwrap();
        assert!(values.iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert_eq!(values[0], 0.0);
        assert_eq!(values[NUM_PIXELS], 128.0 / 255.0);
        assert_eq!(values[2 * NUM_PIXELS], 1.0);
    }

    #[test]
    fn batch_flattens_row_major_and_reshape_restores_the_grid() {
        let device = Default::default();
        let mut image = [[0.0f32; WIDTH]; HEIGHT];
        for (y, row) in image.iter_mut().enumerate() {
            for (x, pixel) in row.iter_mut().enumerate() {
                *pixel = (y * WIDTH + x) as f32;
            }
        }
        let item = MnistItem { image, label: 0 };

        let batch: MnistBatch<TestBackend> = MnistBatcher.batch(vec![item], &device);
        let flat = batch.images.clone().to_data().to_vec::<f32>().unwrap();
        for (index, value) in flat.iter().enumerate() {
            assert_eq!(*value, index as f32 / 255.0);
        }

        // Reshaping the flat row back to 28x28 is lossless.
        let restored = batch.images.reshape([HEIGHT, WIDTH]);
        let expected =
            Tensor::<TestBackend, 2>::from_data(TensorData::from(image), &device) / 255;
        assert_eq!(
            restored.to_data().to_vec::<f32>().unwrap(),
            expected.to_data().to_vec::<f32>().unwrap()
        );
    }

    #[test]
    fn batch_encodes_both_label_representations() {
        let device = Default::default();
        let items = vec![
            item_with_constant_pixels(0.0, 7),
            item_with_constant_pixels(0.0, 3),
        ];

        let batch: MnistBatch<TestBackend> = MnistBatcher.batch(items, &device);

        assert_eq!(batch.targets.to_data().to_vec::<i64>().unwrap(), vec![7, 3]);

        assert_eq!(batch.targets_one_hot.dims(), [2, NUM_CLASSES]);
        let one_hots = batch.targets_one_hot.to_data().to_vec::<f32>().unwrap();
        let mut expected = vec![0.0; 2 * NUM_CLASSES];
        expected[7] = 1.0;
        expected[NUM_CLASSES + 3] = 1.0;
        assert_eq!(one_hots, expected);
    }
}
