/// Key-construction helpers shared by the content store and the engine.
#[derive(Debug, Clone)]
pub struct KeyContext<'a> {
    pub prefix: &'a str,
    pub service: &'a str,
}

pub const POSTS: &str = "posts";
pub const COMMENTS: &str = "comments";

impl<'a> KeyContext<'a> {
    pub fn new(prefix: &'a str, service: &'a str) -> Self {
        Self { prefix, service }
    }

    pub fn entity(&self, collection: &str, entity_id: &str) -> String {
        format!("{}:{}:{}:{}", self.prefix, self.service, collection, entity_id)
    }

    pub fn post(&self, post_id: &str) -> String {
        self.entity(POSTS, post_id)
    }

    pub fn comment(&self, comment_id: &str) -> String {
        self.entity(COMMENTS, comment_id)
    }

    /// Ordered comment ids under one post, in submission order.
    pub fn comment_index(&self, post_id: &str) -> String {
        format!("{}:{}:{}:{}:comment_ids", self.prefix, self.service, POSTS, post_id)
    }

    /// Every post id in publish order.
    pub fn feed_index(&self) -> String {
        format!("{}:{}:feed", self.prefix, self.service)
    }

    /// Per-target reaction records: one field per actor holding one kind.
    pub fn reactions(&self, target_id: &str) -> String {
        format!("{}:{}:reactions:{}", self.prefix, self.service, target_id)
    }

    pub fn service_pattern(&self) -> String {
        format!("{}:{}:*", self.prefix, self.service)
    }
}
