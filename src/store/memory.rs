use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{StoreError, TodoStore, UserStore};
use crate::auth::repo_types::{NewUser, User, UserChanges};
use crate::todos::repo_types::{NewTodo, Todo, TodoChanges, TodoFilter};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    todos: BTreeMap<i64, Todo>,
    next_user_id: i64,
    next_todo_id: i64,
}

impl Tables {
    fn user_clashes(&self, skip: Option<i64>, username: &str, email: &str) -> bool {
        self.users.values().any(|u| {
            Some(u.id) != skip && (u.username == username || u.email_address == email)
        })
    }

    fn todo_clashes(&self, skip: Option<i64>, todo: &Todo) -> bool {
        self.todos.values().any(|t| {
            Some(t.id) != skip && t.title == todo.title && t.deadline == todo.deadline
        })
    }
}

/// In-process store enforcing the same constraints as the Postgres schema:
/// unique username/email, unique (title, deadline), owner must exist, and
/// deleting a user cascades to their tasks. Every write takes the lock once,
/// so a rejected write leaves nothing behind.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, new: NewUser) -> Result<User, StoreError> {
        let mut t = self.tables.write();
        if t.user_clashes(None, &new.username, &new.email_address) {
            return Err(StoreError::Conflict);
        }
        t.next_user_id += 1;
        let user = User {
            id: t.next_user_id,
            username: new.username,
            first_name: new.first_name,
            last_name: new.last_name,
            date_of_birth: new.date_of_birth,
            email_address: new.email_address,
            phone_number: new.phone_number,
            password_hash: new.password_hash,
            role: new.role,
            is_active: new.is_active,
        };
        t.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn user_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().users.get(&id).cloned())
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .tables
            .read()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.tables.read().users.values().cloned().collect())
    }

    async fn update_user(
        &self,
        id: i64,
        changes: UserChanges,
    ) -> Result<Option<User>, StoreError> {
        let mut t = self.tables.write();
        let Some(mut updated) = t.users.get(&id).cloned() else {
            return Ok(None);
        };
        changes.apply(&mut updated);
        if t.user_clashes(Some(id), &updated.username, &updated.email_address) {
            return Err(StoreError::Conflict);
        }
        t.users.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn set_password_hash(&self, id: i64, password_hash: &str) -> Result<bool, StoreError> {
        let mut t = self.tables.write();
        match t.users.get_mut(&id) {
            Some(u) => {
                u.password_hash = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_user(&self, id: i64) -> Result<bool, StoreError> {
        let mut t = self.tables.write();
        if t.users.remove(&id).is_none() {
            return Ok(false);
        }
        t.todos.retain(|_, todo| todo.user_id != id);
        Ok(true)
    }
}

#[async_trait]
impl TodoStore for MemoryStore {
    async fn insert_todo(&self, new: NewTodo) -> Result<Todo, StoreError> {
        let mut t = self.tables.write();
        if !t.users.contains_key(&new.user_id) {
            return Err(StoreError::MissingOwner);
        }
        let todo = Todo {
            id: t.next_todo_id + 1,
            title: new.title,
            deadline: new.deadline,
            description: new.description,
            priority: new.priority,
            is_completed: new.is_completed,
            user_id: new.user_id,
        };
        if t.todo_clashes(None, &todo) {
            return Err(StoreError::Conflict);
        }
        t.next_todo_id = todo.id;
        t.todos.insert(todo.id, todo.clone());
        Ok(todo)
    }

    async fn todo_by_id(&self, id: i64) -> Result<Option<Todo>, StoreError> {
        Ok(self.tables.read().todos.get(&id).cloned())
    }

    async fn todos_by_user(&self, user_id: i64) -> Result<Vec<Todo>, StoreError> {
        Ok(self
            .tables
            .read()
            .todos
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_todos(&self) -> Result<Vec<Todo>, StoreError> {
        Ok(self.tables.read().todos.values().cloned().collect())
    }

    async fn search_todos(&self, filter: &TodoFilter) -> Result<Vec<Todo>, StoreError> {
        Ok(self
            .tables
            .read()
            .todos
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect())
    }

    async fn update_todo(
        &self,
        id: i64,
        changes: TodoChanges,
    ) -> Result<Option<Todo>, StoreError> {
        let mut t = self.tables.write();
        let Some(mut updated) = t.todos.get(&id).cloned() else {
            return Ok(None);
        };
        changes.apply(&mut updated);
        if t.todo_clashes(Some(id), &updated) {
            return Err(StoreError::Conflict);
        }
        t.todos.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn delete_todo(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.tables.write().todos.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo_types::Role;
    use crate::todos::repo_types::Priority;
    use time::macros::date;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.into(),
            first_name: "Test".into(),
            last_name: "User".into(),
            date_of_birth: date!(1990 - 01 - 01),
            email_address: email.into(),
            phone_number: None,
            password_hash: "hash".into(),
            role: Role::User,
            is_active: true,
        }
    }

    fn new_todo(title: &str, user_id: i64) -> NewTodo {
        NewTodo {
            title: title.into(),
            deadline: date!(2025 - 01 - 01),
            description: None,
            priority: Priority::High,
            is_completed: false,
            user_id,
        }
    }

    #[tokio::test]
    async fn rejects_duplicate_username_or_email() {
        let store = MemoryStore::new();
        store.insert_user(new_user("alice01", "alice@x.com")).await.unwrap();

        let err = store
            .insert_user(new_user("alice01", "other@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
        let err = store
            .insert_user(new_user("alice02", "alice@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
        assert_eq!(store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejects_duplicate_title_and_deadline() {
        let store = MemoryStore::new();
        let alice = store.insert_user(new_user("alice01", "alice@x.com")).await.unwrap();
        store.insert_todo(new_todo("Write spec", alice.id)).await.unwrap();
        let err = store
            .insert_todo(new_todo("Write spec", alice.id))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
        assert_eq!(store.list_todos().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejects_task_for_unknown_owner() {
        let store = MemoryStore::new();
        let err = store.insert_todo(new_todo("Write spec", 42)).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingOwner));
    }

    #[tokio::test]
    async fn update_conflict_leaves_record_untouched() {
        let store = MemoryStore::new();
        let alice = store.insert_user(new_user("alice01", "alice@x.com")).await.unwrap();
        store.insert_todo(new_todo("Write spec", alice.id)).await.unwrap();
        let second = store.insert_todo(new_todo("Review spec", alice.id)).await.unwrap();

        let err = store
            .update_todo(
                second.id,
                TodoChanges {
                    title: Some("Write spec".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
        let stored = store.todo_by_id(second.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Review spec");
    }

    #[tokio::test]
    async fn deleting_user_cascades_to_tasks() {
        let store = MemoryStore::new();
        let alice = store.insert_user(new_user("alice01", "alice@x.com")).await.unwrap();
        let bob = store.insert_user(new_user("bobby01", "bob@x.com")).await.unwrap();
        let a = store.insert_todo(new_todo("Alice task", alice.id)).await.unwrap();
        let b = store.insert_todo(new_todo("Bobby task", bob.id)).await.unwrap();

        assert!(store.delete_user(alice.id).await.unwrap());
        assert!(store.todo_by_id(a.id).await.unwrap().is_none());
        assert!(store.todo_by_id(b.id).await.unwrap().is_some());
        assert!(!store.delete_user(alice.id).await.unwrap());
    }
}
