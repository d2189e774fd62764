use std::marker::PhantomData;

use derive_new::new;

use crate::Dataset;

/// Basic mapper trait to transform an item of type I into another type O.
pub trait Mapper<I, O> {
    /// Maps an item of type I to type O.
    fn map(&self, item: &I) -> O;
}

/// Dataset applying a [Mapper] to each item of a source dataset, lazily at
/// `get` time.
#[derive(new)]
pub struct MapperDataset<D, M, I> {
    dataset: D,
    mapper: M,
    input: PhantomData<I>,
}

impl<D, M, I, O> Dataset<O> for MapperDataset<D, M, I>
where
    D: Dataset<I>,
    M: Mapper<I, O> + Send + Sync,
    I: Send + Sync,
    O: Send + Sync,
{
    fn get(&self, index: usize) -> Option<O> {
        let item = self.dataset.get(index);
        item.map(|item| self.mapper.map(&item))
    }

    fn len(&self) -> usize {
        self.dataset.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemDataset;

    #[test]
    pub fn given_mapper_dataset_when_iterate_should_iterate_though_all_map_items() {
        struct StringToFirstChar;

        impl Mapper<String, String> for StringToFirstChar {
            fn map(&self, item: &String) -> String {
                let mut item = item.clone();
                item.truncate(1);
                item
            }
        }

        let items_original = vec![
            "one".to_string(),
            "two".to_string(),
            "three".to_string(),
        ];
        let dataset = InMemDataset::new(items_original);
        let dataset = MapperDataset::new(dataset, StringToFirstChar);

        let items: Vec<String> = dataset.iter().collect();

        assert_eq!(vec!["o", "t", "t"], items);
    }

    #[test]
    pub fn mapper_dataset_preserves_length() {
        struct Double;

        impl Mapper<i32, i32> for Double {
            fn map(&self, item: &i32) -> i32 {
                item * 2
            }
        }

        let dataset = MapperDataset::new(InMemDataset::new(vec![1, 2, 3]), Double);

        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.get(1), Some(4));
        assert_eq!(dataset.get(3), None);
    }
}
