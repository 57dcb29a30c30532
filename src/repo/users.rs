use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tracing::warn;

use crate::matching::matches;
use crate::models::{NewUser, Role, UpdateUser, User};
use crate::store::KeyValueStore;

use super::USERS_KEY;

pub struct UserRepository {
    store: Arc<dyn KeyValueStore>,
}

impl UserRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Loads the user list, seeding the default manager account the first
    /// time the store is used.
    pub async fn list(&self) -> Result<Vec<User>> {
        match self.store.get(USERS_KEY).await? {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(users) => Ok(users),
                Err(err) => {
                    warn!(error = %err, "stored user list is unreadable, treating as empty");
                    Ok(Vec::new())
                }
            },
            None => {
                let users = default_users();
                self.save(&users).await?;
                Ok(users)
            }
        }
    }

    async fn save(&self, users: &[User]) -> Result<()> {
        self.store
            .put(USERS_KEY, serde_json::to_string(users)?)
            .await
    }

    pub async fn find(&self, id: &str) -> Result<Option<User>> {
        Ok(self.list().await?.into_iter().find(|user| user.id == id))
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|user| user.username == username))
    }

    /// Plaintext comparison, matching the stored user model.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|user| user.username == username && user.password == password))
    }

    pub async fn create(&self, new: NewUser) -> Result<User> {
        let mut users = self.list().await?;

        let mut timestamp = Utc::now().timestamp_millis();
        while users.iter().any(|user| user.id == timestamp.to_string()) {
            timestamp += 1;
        }

        let user = User {
            id: timestamp.to_string(),
            username: new.username,
            password: new.password,
            name: new.name,
            role: new.role,
            work_place: new.work_place,
            administrative_work_places: new.administrative_work_places,
        };

        users.push(user.clone());
        self.save(&users).await?;
        Ok(user)
    }

    pub async fn update(&self, id: &str, updates: UpdateUser) -> Result<Option<User>> {
        let mut users = self.list().await?;
        let Some(user) = users.iter_mut().find(|user| user.id == id) else {
            return Ok(None);
        };

        if let Some(username) = updates.username {
            user.username = username;
        }
        if let Some(password) = updates.password {
            user.password = password;
        }
        if let Some(name) = updates.name {
            user.name = name;
        }
        if let Some(role) = updates.role {
            user.role = role;
        }
        if let Some(work_place) = updates.work_place {
            user.work_place = Some(work_place);
        }
        if let Some(places) = updates.administrative_work_places {
            user.administrative_work_places = Some(places);
        }

        let updated = user.clone();
        self.save(&users).await?;
        Ok(Some(updated))
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let mut users = self.list().await?;
        let before = users.len();
        users.retain(|user| user.id != id);
        let existed = users.len() != before;
        if existed {
            self.save(&users).await?;
        }
        Ok(existed)
    }
}

pub fn default_users() -> Vec<User> {
    vec![User {
        id: "1".to_string(),
        username: "admin".to_string(),
        password: "admin".to_string(),
        name: "المدير".to_string(),
        role: Role::Manager,
        work_place: None,
        administrative_work_places: Some(Vec::new()),
    }]
}

/// Names of all inspector-role users.
pub fn all_inspectors(users: &[User]) -> Vec<String> {
    users
        .iter()
        .filter(|user| user.role == Role::Inspector)
        .map(|user| user.name.clone())
        .collect()
}

/// The inspector pick-list for a set of workplaces: inspectors whose home
/// workplace matches, plus supervisors/managers whose administrative AND home
/// workplaces both match the selection.
pub fn inspectors_by_workplaces(users: &[User], workplaces: &[String]) -> Vec<String> {
    let mut result = Vec::new();

    for user in users {
        match user.role {
            Role::Inspector => {
                let Some(work_place) = &user.work_place else {
                    continue;
                };
                if workplaces.iter().any(|wp| matches(work_place, wp)) {
                    result.push(user.name.clone());
                }
            }
            Role::Supervisor | Role::Manager => {
                let administrative = user
                    .administrative_work_places
                    .as_deref()
                    .unwrap_or_default();
                if administrative.is_empty() {
                    continue;
                }

                let admin_matches = workplaces.iter().any(|wp| {
                    administrative
                        .iter()
                        .any(|admin_place| matches(admin_place, wp))
                });
                let regular_matches = user
                    .work_place
                    .as_deref()
                    .is_some_and(|work_place| {
                        workplaces.iter().any(|wp| matches(work_place, wp))
                    });

                if admin_matches && regular_matches {
                    result.push(user.name.clone());
                }
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn user(name: &str, role: Role, work_place: Option<&str>, admin: Option<&[&str]>) -> User {
        User {
            id: name.to_string(),
            username: name.to_string(),
            password: "x".to_string(),
            name: name.to_string(),
            role,
            work_place: work_place.map(str::to_string),
            administrative_work_places: admin
                .map(|places| places.iter().map(|p| p.to_string()).collect()),
        }
    }

    #[tokio::test]
    async fn first_list_seeds_default_manager() {
        let repo = UserRepository::new(Arc::new(MemoryStore::new()));
        let users = repo.list().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "admin");
        assert_eq!(users[0].role, Role::Manager);

        let admin = repo.authenticate("admin", "admin").await.unwrap();
        assert!(admin.is_some());
        assert!(repo.authenticate("admin", "wrong").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn crud_round_trip() {
        let repo = UserRepository::new(Arc::new(MemoryStore::new()));
        repo.list().await.unwrap();

        let created = repo
            .create(NewUser {
                username: "ahmed".to_string(),
                password: "secret".to_string(),
                name: "أحمد".to_string(),
                role: Role::Inspector,
                work_place: Some("مركز دسوق".to_string()),
                administrative_work_places: None,
            })
            .await
            .unwrap();

        let updated = repo
            .update(
                &created.id,
                UpdateUser {
                    work_place: Some("مركز فوة".to_string()),
                    ..UpdateUser::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.work_place.as_deref(), Some("مركز فوة"));

        assert!(repo.delete(&created.id).await.unwrap());
        assert!(repo.find(&created.id).await.unwrap().is_none());
    }

    #[test]
    fn pick_list_includes_matching_inspectors_only() {
        let users = vec![
            user("أحمد", Role::Inspector, Some("مركز دسوق"), None),
            user("سارة", Role::Inspector, Some("مركز فوة"), None),
            user("بلا جهة", Role::Inspector, None, None),
        ];

        let selected = vec!["دسوق".to_string()];
        assert_eq!(inspectors_by_workplaces(&users, &selected), vec!["أحمد"]);
    }

    #[test]
    fn pick_list_requires_both_workplaces_for_supervisors() {
        let both = user(
            "منى",
            Role::Supervisor,
            Some("مركز دسوق"),
            Some(&["مركز دسوق"]),
        );
        let admin_only = user("هدى", Role::Supervisor, None, Some(&["مركز دسوق"]));
        let users = vec![both, admin_only];

        let selected = vec!["مركز دسوق".to_string()];
        assert_eq!(inspectors_by_workplaces(&users, &selected), vec!["منى"]);
    }
}
