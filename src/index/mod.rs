pub mod dictionary;
pub mod documents;
pub mod inverted;
pub mod permuterm;
pub mod phonetic;
pub mod posting;
pub mod skiplist;
